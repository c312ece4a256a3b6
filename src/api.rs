use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

use crate::content::{ContentError, Resource};
use crate::dismiss::{DismissStore, dismiss_key, dismissal_day};
use crate::site::Site;

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

pub struct ApiState {
    pub site: Site,
    pub dismissed: Mutex<DismissStore>,
}

pub struct ApiServer {
    stop: Arc<AtomicBool>,
    http_join: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn start(config: ApiServerConfig, state: ApiState) -> Result<Self> {
        let bind = format!("{}:{}", config.bind_addr, config.port);
        let server = Server::http(&bind)
            .map_err(|err| anyhow::anyhow!("failed to start API server on {bind}: {err}"))?;
        info!(%bind, resources = %state.site.resources().root().display(), "site API listening");

        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let http_join = thread::spawn(move || run_server_loop(server, state, stop_for_thread));

        Ok(Self {
            stop,
            http_join: Some(http_join),
        })
    }

    pub fn is_running(&self) -> bool {
        self.http_join
            .as_ref()
            .is_some_and(|join| !join.is_finished())
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.http_join.take() {
            let _ = join.join();
        }
    }
}

fn run_server_loop(server: Server, state: ApiState, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match server.recv_timeout(Duration::from_millis(200)) {
            Ok(Some(request)) => handle_request(request, &state),
            Ok(None) => continue,
            Err(err) => {
                debug!(error = %err, "request receive failed");
                continue;
            }
        }
    }
}

fn handle_request(request: tiny_http::Request, state: &ApiState) {
    let url = request.url().to_string();
    let (path, query) = split_path_query(&url);
    let reply = route(state, request.method(), path, query);
    debug!(method = %request.method(), path, status = reply.status(), "request handled");

    let sent = match reply {
        Reply::Json(status, body) => send_json(request, StatusCode(status), &body),
        Reply::Text(status, body) => send_text(request, StatusCode(status), &body),
    };
    if let Err(err) = sent {
        warn!(error = %err, path, "failed to send response");
    }
}

#[derive(Debug)]
enum Reply {
    Json(u16, Value),
    Text(u16, String),
}

impl Reply {
    fn status(&self) -> u16 {
        match self {
            Reply::Json(status, _) | Reply::Text(status, _) => *status,
        }
    }

    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Reply::Json(200, value),
            Err(err) => {
                error!(error = %err, "failed to serialize response");
                Reply::Text(500, "internal serialization error".to_string())
            }
        }
    }

    fn from_content<T: Serialize>(resource: Resource, result: Result<T, ContentError>) -> Self {
        match result {
            Ok(view) => Reply::ok(&view),
            Err(err) => {
                warn!(resource = resource.file_name(), error = %err, "resource unavailable");
                Reply::Text(503, resource.unavailable_message().to_string())
            }
        }
    }
}

fn route(state: &ApiState, method: &Method, path: &str, query: &str) -> Reply {
    let site = &state.site;
    match (method, path) {
        (Method::Get, "/healthz") => Reply::Text(200, "ok".to_string()),
        (Method::Get, "/api/theme") => Reply::ok(&site.theme()),
        (Method::Get, "/api/status") => Reply::ok(&site.status()),
        (Method::Get, "/api/rules") => Reply::from_content(Resource::Rules, site.rules()),
        (Method::Get, "/api/announcements") => {
            Reply::from_content(Resource::Announcements, site.announcements())
        }
        (Method::Get, "/api/announcements/modal") => {
            let Ok(dismissed) = state.dismissed.lock() else {
                return Reply::Text(500, "internal state lock error".to_string());
            };
            Reply::from_content(Resource::Announcements, site.modal_queue(&dismissed))
        }
        (Method::Post, "/api/announcements/modal/dismiss") => dismiss_modal(state, query),
        (Method::Get, "/api/updates") => Reply::from_content(Resource::Updates, site.updates()),
        (Method::Get, "/api/vote") => Reply::from_content(Resource::Vote, site.vote()),
        (Method::Get, "/api/players") => {
            let server = decoded_param(query, "server");
            Reply::from_content(Resource::Players, site.players(server.as_deref()))
        }
        (Method::Get, "/api/events") => Reply::from_content(Resource::Events, site.events()),
        (_, "/healthz" | "/api/theme" | "/api/status" | "/api/rules" | "/api/announcements")
        | (_, "/api/announcements/modal" | "/api/announcements/modal/dismiss")
        | (_, "/api/updates" | "/api/vote" | "/api/players" | "/api/events") => {
            Reply::Text(405, "method not allowed".to_string())
        }
        _ => Reply::Text(404, "not found".to_string()),
    }
}

fn dismiss_modal(state: &ApiState, query: &str) -> Reply {
    let Some(id) = decoded_param(query, "id").filter(|id| !id.is_empty()) else {
        return Reply::Text(400, "missing id".to_string());
    };
    let day = dismissal_day(&state.site.now());
    let Ok(mut dismissed) = state.dismissed.lock() else {
        return Reply::Text(500, "internal state lock error".to_string());
    };
    if let Err(err) = dismissed.dismiss(&id, day) {
        error!(error = %err, id = %id, "failed to persist dismissal");
        return Reply::Text(500, "failed to persist dismissal".to_string());
    }
    let key = dismiss_key(&id, day);
    Reply::Json(
        200,
        json!({
            "id": id,
            "day": day.format("%Y-%m-%d").to_string(),
            "key": key,
        }),
    )
}

fn send_json<T: Serialize>(
    request: tiny_http::Request,
    status: StatusCode,
    body: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(body)?;
    let content_type = Header::from_str("Content-Type: application/json; charset=utf-8")
        .map_err(|_| anyhow::anyhow!("failed to build content-type header"))?;
    request.respond(
        Response::from_data(payload)
            .with_status_code(status)
            .with_header(content_type),
    )?;
    Ok(())
}

fn send_text(request: tiny_http::Request, status: StatusCode, body: &str) -> Result<()> {
    let content_type = Header::from_str("Content-Type: text/plain; charset=utf-8")
        .map_err(|_| anyhow::anyhow!("failed to build content-type header"))?;
    request.respond(
        Response::from_string(body.to_string())
            .with_status_code(status)
            .with_header(content_type),
    )?;
    Ok(())
}

fn split_path_query(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        if k == key {
            return Some(v);
        }
    }
    None
}

/// Percent-decoded query value. `+` is read as a space, as browsers send it.
fn decoded_param(query: &str, key: &str) -> Option<String> {
    let raw = query_param(query, key)?.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|value| value.into_owned())
        .ok()
}
