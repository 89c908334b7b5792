use crate::config::SetupSection;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_section(req: &Request) -> Result<SetupSection, HandlerErr> {
    let raw = required_str(req, "section")?;
    SetupSection::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown section: {}", raw)))
}

fn setup_get(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let section = parse_section(req)?;
    Ok(json!({
        "section": req.params.get("section"),
        "values": state.config.section_json(section)
    }))
}

fn setup_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let section = parse_section(req)?;
    let Some(patch) = req.params.get("patch") else {
        return Err(HandlerErr::bad_params("missing patch"));
    };
    state
        .config
        .apply_patch(section, patch)
        .map_err(HandlerErr::bad_params)?;
    tracing::info!(section = ?section, "setup updated");
    Ok(json!({
        "section": req.params.get("section"),
        "values": state.config.section_json(section)
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(respond(&req.id, setup_get(state, req))),
        "setup.update" => Some(respond(&req.id, setup_update(state, req))),
        _ => None,
    }
}
