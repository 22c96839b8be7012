// ==========================================
// 看板补货调度 - 扫码入口壳页面
// ==========================================
// GET /x/kanban/{id}
// 成功: 转圈 + 立即跳转到目标路径
// 失败: 以 role="alert" 展示错误文案, 不跳转
// ==========================================

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Html;

use crate::api::kanban_api::{dispatch_kanban, DispatchResponse};
use crate::api::SharedState;

pub async fn get_kanban_shell(
    State(state): State<SharedState>,
    Path(kanban_id): Path<String>,
    headers: HeaderMap,
) -> Html<String> {
    let response = DispatchResponse::from(dispatch_kanban(&state, &kanban_id, &headers).await);
    Html(render_shell(&response))
}

/// 渲染壳页面
pub fn render_shell(response: &DispatchResponse) -> String {
    let body = match (&response.data, &response.error) {
        (Some(path), _) => {
            let href = escape_html(path);
            let js_path = escape_js(path);
            format!(
                concat!(
                    "<meta http-equiv=\"refresh\" content=\"0; url={href}\">\n",
                    "<div class=\"spinner\" aria-busy=\"true\" aria-label=\"Loading\"></div>\n",
                    "<noscript><a href=\"{href}\">Continue</a></noscript>\n",
                    "<script>window.location.replace(\"{js}\");</script>\n"
                ),
                href = href,
                js = js_path
            )
        }
        (None, Some(error)) => format!(
            "<div class=\"error\" role=\"alert\">{}</div>\n",
            escape_html(error)
        ),
        (None, None) => "<div class=\"error\" role=\"alert\">Unknown error</div>\n".to_string(),
    };

    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<title>Kanban</title>\n",
            "<style>",
            ".spinner{{width:32px;height:32px;margin:40vh auto;border:4px solid #ddd;",
            "border-top-color:#333;border-radius:50%;animation:spin 1s linear infinite}}",
            "@keyframes spin{{to{{transform:rotate(360deg)}}}}",
            ".error{{margin:40vh auto;max-width:480px;text-align:center;color:#b00020;font-family:sans-serif}}",
            "</style>\n",
            "</head>\n<body>\n{body}</body>\n</html>\n"
        ),
        body = body
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// JSON 字符串转义后再屏蔽 "</" 以免提前闭合 script
fn escape_js(input: &str) -> String {
    let quoted = serde_json::to_string(input).unwrap_or_else(|_| "\"\"".to_string());
    quoted[1..quoted.len() - 1].replace("</", "<\\/")
}
