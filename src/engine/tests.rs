use std::io::Read;

use tiny_http::{Request, Response, Server};

use super::{Client, EngineError, ImageSource};

/// Start a HTTP server in a random port.
///
/// Request are handled in `handler`. The server is stopped when the
/// function returns `false`
///
/// Returns the port number of the server.
fn test_http_server<F>(mut handler: F) -> u16
where
    F: FnMut(Request) -> bool,
    F: Send + 'static,
{
    let server = Server::http("127.1:0").expect("start HTTP server");
    let port = server.server_addr().to_ip().unwrap().port();

    std::thread::spawn(move || {
        let timeout = std::time::Duration::from_secs(60);
        while let Ok(Some(request)) = server.recv_timeout(timeout) {
            if !handler(request) {
                break;
            }
        }
    });

    port
}

fn engine_server() -> u16 {
    test_http_server(|req| {
        // Use the `url` crate to parse the request query.
        let base_url = url::Url::parse("http://0").ok();
        let url_parser = url::Url::options().base_url(base_url.as_ref());

        let req_url = url_parser.parse(req.url()).unwrap();

        let user_agent = req
            .headers()
            .iter()
            .find(|h| h.field.equiv("user-agent"))
            .map(|h| h.value.to_string())
            .unwrap_or_default();

        assert!(user_agent.starts_with("image-files/"), "{user_agent}");

        let response = match req_url.path() {
            "/v1.43/version" => Response::from_string(r#"{"Version": "25.0.3", "ApiVersion": "1.44"}"#),

            "/v1.43/images/alpine:3/json" => Response::from_string(
                r#"{
                    "Id": "sha256:aaaa",
                    "RootFS": {
                        "Type": "layers",
                        "Layers": ["sha256:1111", "sha256:2222"]
                    }
                }"#,
            ),

            "/v1.43/images/get" => {
                let names: Vec<_> = req_url
                    .query_pairs()
                    .filter(|(k, _)| k == "names")
                    .map(|(_, v)| v.into_owned())
                    .collect();

                Response::from_string(format!("archive of {}", names.join(",")))
            }

            _ => Response::from_string(r#"{"message": "No such image"}"#).with_status_code(404),
        };

        req.respond(response).expect("Send response");

        true
    })
}

#[test]
fn inspect_and_export() {
    let port = engine_server();
    let client = Client::new(&format!("tcp://127.0.0.1:{port}"))
        .unwrap()
        .api_version("v1.43");

    assert_eq!(client.base_url(), format!("http://127.0.0.1:{port}/v1.43"));

    assert_eq!(client.engine_version().unwrap(), "25.0.3");

    let metadata = client.inspect("alpine:3").unwrap();
    assert_eq!(metadata.id, "sha256:aaaa");
    assert_eq!(metadata.layers, ["sha256:1111", "sha256:2222"]);

    let mut archive = String::new();
    client
        .export("alpine:3")
        .unwrap()
        .read_to_string(&mut archive)
        .unwrap();

    assert_eq!(archive, "archive of alpine:3");
}

#[test]
fn missing_image() {
    let port = engine_server();
    let client = Client::new(&format!("127.0.0.1:{port}"))
        .unwrap()
        .api_version("1.43");

    let err = client.inspect("missing").unwrap_err();

    assert!(
        matches!(&err, EngineError::Http(e) if matches!(**e, ureq::Error::Status(404, _))),
        "{err:?}"
    );
}
