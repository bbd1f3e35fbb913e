use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const BOOKS_JSON: &str = r#"{
  "1": {"id":1,"parentBookId":1,"tocName":"Gen.","gridName":"Genesis","fullName":"The First Book of Moses called Genesis","numChapters":50,"citeAbbr":"Gen."},
  "2": {"id":2,"parentBookId":1,"tocName":"Obad.","gridName":"Obadiah","fullName":"Obadiah","numChapters":1,"citeAbbr":"Obad."},
  "3": {"id":3,"parentBookId":2,"tocName":"Intro.","gridName":"Introduction","fullName":"Introduction","numChapters":0,"citeAbbr":"Intro."},
  "4": {"id":4,"parentBookId":2,"tocName":"Mark","gridName":"Mark","fullName":"The Gospel According to St Mark","numChapters":16,"citeAbbr":"Mark"}
}"#;

pub const VOLUMES_JSON: &str = r#"[
  {"id":1,"fullName":"Old Testament","minBookId":1,"maxBookId":2},
  {"id":2,"fullName":"New Testament","minBookId":3,"maxBookId":4}
]"#;

pub const MARK_2_HTML: &str = r#"<div class="navheading"><div class="chapterheading">Mark 2</div></div>
<ul class="versesblock">
<li>And again he entered into <a onclick="showLocation(91,'Capernaum',32.880330,35.573307,32.880330,35.573307,0.0,0.0,4500.0,0.0,'')">Capernaum</a>.</li>
<li>He went forth again by <a onclick="showLocation(92,'Sea of Galilee',32.830000,35.590000,32.830000,35.590000,0.0,0.0,60000.0,0.0,'')">the sea side</a>.</li>
<li>Back in <a onclick="showLocation(93,'Capernaum',32.880330,35.573307,32.880330,35.573307,0.0,0.0,4500.0,0.0,'')">Capernaum</a>.</li>
</ul>"#;

pub const OBADIAH_HTML: &str = r#"<div class="navheading"><div class="chapterheading">Obadiah</div></div>
<p>Concerning <a onclick="showLocation(7,'Edom',30.730000,35.600000,30.730000,35.600000,0.0,0.0,900.0,0.0,'')">Edom</a>.</p>"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiStubConfig {
    pub fail_volumes: bool,
}

pub struct ApiStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ApiStub {
    pub fn spawn(config: ApiStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start api stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

                let (status, body, content_type) = match path {
                    "/mapscrip/model/books.php" => (200, BOOKS_JSON, "application/json"),
                    "/mapscrip/model/volumes.php" if config.fail_volumes => {
                        (500, "volume table unavailable", "text/plain")
                    }
                    "/mapscrip/model/volumes.php" => (200, VOLUMES_JSON, "application/json"),
                    "/mapscrip/mapgetscrip.php" => match query {
                        "book=4&chap=2&verses=" => (200, MARK_2_HTML, "text/html"),
                        "book=2&chap=1&verses=" => (200, OBADIAH_HTML, "text/html"),
                        _ => (404, "no such chapter", "text/plain"),
                    },
                    _ => (404, "not found", "text/plain"),
                };

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                        .expect("content-type header");
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for ApiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
