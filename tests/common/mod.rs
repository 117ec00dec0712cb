#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Write `content` to a uniquely named file in the temp dir
    pub fn create_temp_spec(content: &str, ext: &str) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "liveroute_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_spec(content, "yaml")
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod specs {
    use liveroute::spec::{OperationDescriptor, ResultShape, SpecDocument};
    use serde_json::json;

    pub const WIDGETS_YAML: &str = r#"openapi: 3.1.0
info:
  title: Widget Store
  version: '1.0'
paths:
  /widgets:
    get:
      operationId: listWidgets
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema:
                type: array
                items: { $ref: '#/components/schemas/Widget' }
    post:
      operationId: createWidget
      responses:
        '201':
          description: Created
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Widget' }
components:
  schemas:
    Widget:
      type: object
      required: [id, name]
      properties:
        id: { type: integer }
        name: { type: string }
"#;

    pub const GADGETS_YAML: &str = r#"openapi: 3.1.0
info:
  title: Gadget Store
  version: '2.0'
paths:
  /gadgets:
    get:
      operationId: listGadgets
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema: { type: array }
"#;

    /// Document with a single group holding one operation that returns `value`
    pub fn single(group_path: &str, operation: &str, value: serde_json::Value) -> SpecDocument {
        SpecDocument::new("Single", "1").with_operation(OperationDescriptor::new(
            operation,
            http::Method::GET,
            group_path,
            ResultShape::from_schema(json!({ "example": value })),
        ))
    }
}

pub mod http_client {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw HTTP request and collect whatever arrives before the read timeout
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    pub fn get(addr: &SocketAddr, path: &str) -> (u16, serde_json::Value) {
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        parse_response(&send_request(addr, &req))
    }

    pub fn post(addr: &SocketAddr, path: &str, body: &str) -> (u16, serde_json::Value) {
        let req = format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/yaml\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        parse_response(&send_request(addr, &req))
    }

    pub fn parse_response(resp: &str) -> (u16, serde_json::Value) {
        let mut parts = resp.splitn(2, "\r\n\r\n");
        let headers = parts.next().unwrap_or("");
        let body = parts.next().unwrap_or("");
        let status = headers
            .lines()
            .find(|l| l.starts_with("HTTP/1.1"))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let json: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        (status, json)
    }
}

pub mod test_server {
    use std::sync::Once;

    static MAY_INIT: Once = Once::new();

    /// Configure the `may` runtime once per test binary
    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
