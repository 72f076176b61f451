use std::time::Duration;

use tiny_http::{Header, Request, Response, Server};

/// Start a fake engine server in a random port.
///
/// The engine stores a single image, and reports `version` in the
/// `/version` endpoint. If `version` is `None`, the endpoint fails.
///
/// Returns the port number of the server.
pub fn start_engine(
    version: Option<&'static str>,
    image: &'static str,
    layers: Vec<String>,
    archive: Vec<u8>,
) -> u16 {
    let server = Server::http("127.1:0").expect("start engine server");
    let port = server.server_addr().to_ip().unwrap().port();

    let engine = Engine {
        server,
        version,
        inspect_path: format!("/images/{image}/json"),
        image,
        layers,
        archive,
    };

    std::thread::spawn(move || engine.run());

    port
}

struct Engine {
    server: Server,
    version: Option<&'static str>,
    image: &'static str,
    inspect_path: String,
    layers: Vec<String>,
    archive: Vec<u8>,
}

impl Engine {
    fn run(self) {
        let timeout = Duration::from_secs(30);

        while let Ok(Some(request)) = self.server.recv_timeout(timeout) {
            self.handle(request);
        }
    }

    fn handle(&self, request: Request) {
        if request.method() != &tiny_http::Method::Get {
            return;
        }

        // Use the `url` crate to parse the request query.
        let base_url = url::Url::parse("http://0").ok();
        let url_parser = url::Url::options().base_url(base_url.as_ref());
        let url = url_parser.parse(request.url()).unwrap();

        let path = url.path();

        if path == "/version" {
            match self.version {
                Some(version) => Self::send_json(request, serde_json::json!({ "Version": version })),
                None => Self::not_found(request),
            }
            return;
        }

        if path == self.inspect_path {
            let image = serde_json::json!({
                "Id": "sha256:0000",
                "RootFS": {
                    "Type": "layers",
                    "Layers": self.layers,
                },
            });

            Self::send_json(request, image);
            return;
        }

        let export_names = url.query_pairs().filter(|(k, _)| k == "names");
        if path == "/images/get" && export_names.map(|(_, v)| v).eq([self.image]) {
            let response = Response::from_data(self.archive.clone())
                .with_header(Header::from_bytes("Content-Type", "application/x-tar").unwrap());

            request.respond(response).expect("Send response");
            return;
        }

        Self::not_found(request);
    }

    fn send_json(request: Request, body: serde_json::Value) {
        let body = serde_json::to_vec(&body).expect("Serialize JSON");
        let response = Response::from_data(body)
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());

        request.respond(response).expect("Send response");
    }

    fn not_found(request: Request) {
        let response =
            Response::from_string(r#"{"message": "not found"}"#).with_status_code(404);

        request.respond(response).expect("Send response");
    }
}
