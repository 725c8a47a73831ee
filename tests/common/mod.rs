#![allow(dead_code)]

use std::sync::Arc;
use std::thread;

use tiny_http::{Header, Response, Server};

pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Serves every request with `handler(url, authorization)` until the test exits.
pub fn serve<F>(handler: F) -> String
where
    F: Fn(&str, Option<String>) -> Reply + Send + Sync + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("bind fake server");
    let base = format!("http://{}", server.server_addr());
    let handler = Arc::new(handler);
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let auth = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.as_str().to_string());
            let reply = handler(request.url(), auth);
            let content_type =
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
            let response = Response::from_string(reply.body)
                .with_status_code(reply.status)
                .with_header(content_type);
            let _ = request.respond(response);
        }
    });
    base
}

pub fn photo_json(id: u64) -> String {
    format!(
        r#"{{"type":"Photo","id":{id},"width":100,"height":80,"url":"https://www.pexels.com/photo/{id}/","photographer":"P{id}","photographer_url":"","src":{{"original":"https://img/{id}/original.jpg","large2x":"https://img/{id}/large2x.jpg","medium":"https://img/{id}/medium.jpg"}}}}"#
    )
}

pub fn video_json(id: u64) -> String {
    format!(
        r#"{{"type":"Video","id":{id},"width":1920,"height":1080,"url":"https://www.pexels.com/video/{id}/","user":{{"id":1,"name":"V{id}","url":""}},"video_files":[{{"id":1,"quality":"sd","file_type":"video/webm","width":640,"height":360,"link":"https://vid/{id}/sd.webm"}},{{"id":2,"quality":"hd","file_type":"video/mp4","width":1920,"height":1080,"link":"https://vid/{id}/hd.mp4"}}],"video_pictures":[{{"id":1,"picture":"https://img/{id}/picture.jpg","nr":0}}]}}"#
    )
}

pub fn page_json(page: u32, media: &[String]) -> String {
    format!(
        r#"{{"page":{page},"per_page":{},"total_results":100,"media":[{}]}}"#,
        media.len(),
        media.join(",")
    )
}
