use std::io::{self, BufRead, Read, Write};

use mockup_compiler::{compile_preview, ComponentRecord, PreviewDocument};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompileRequest {
    page: ComponentRecord,
    #[serde(default)]
    components: Vec<ComponentRecord>,
    /// Register only records upstream marked `required`.
    #[serde(default)]
    required_only: bool,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Serialize)]
struct CompileResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<PreviewDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CompileResponse {
    fn failed(error: String) -> Self {
        Self {
            ok: false,
            html: None,
            document: None,
            error: Some(error),
        }
    }
}

fn compile(req: CompileRequest) -> CompileResponse {
    let components: Vec<ComponentRecord> = if req.required_only {
        req.components.into_iter().filter(|c| c.required).collect()
    } else {
        req.components
    };
    let document = compile_preview(&req.page, &components);
    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(&req.page));
    CompileResponse {
        ok: true,
        html: Some(document.to_html(&title)),
        document: Some(document),
        error: None,
    }
}

fn default_title(page: &ComponentRecord) -> String {
    if page.name.is_empty() {
        "Mockup Preview".to_string()
    } else {
        page.name.trim_end_matches("Component").to_string()
    }
}

fn respond(input: &str) -> CompileResponse {
    match serde_json::from_str::<CompileRequest>(input) {
        Ok(req) => compile(req),
        Err(e) => CompileResponse::failed(e.to_string()),
    }
}

fn write_response(resp: &CompileResponse) -> io::Result<()> {
    let out = serde_json::to_string(resp)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(out.as_bytes())?;
    handle.write_all(b"\n")?;
    handle.flush()
}

fn main() -> io::Result<()> {
    let daemon = std::env::args().any(|a| a == "--daemon");

    if daemon {
        // JSON Lines: one request per line until stdin closes.
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            write_response(&respond(line))?;
        }
        Ok(())
    } else {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        write_response(&respond(&input))
    }
}
