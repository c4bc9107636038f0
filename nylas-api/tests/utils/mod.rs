use nylas_api::Api;
use nylas_api::domain::SecretString;
use nylas_api::mocks::{ACCESS_TOKEN, ACCOUNT_ID};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::time::Duration;

/// Create a new api and mock server.
pub fn new_mock_api_and_server() -> (Api, mockito::Server) {
    init_tracing();
    let server = nylas_api::mocks::new();
    let api = Api::builder()
        .api_server(server.url())
        .access_token(SecretString::from(ACCESS_TOKEN))
        .account_id(ACCOUNT_ID)
        .allow_http()
        .build()
        .expect("Failed to build api");
    (api, server)
}

/// Create a new api talking to a socket that answers one request with `response` and then keeps
/// the connection open without sending anything for `hold`.
#[allow(dead_code)]
pub fn new_single_response_api(response: Vec<u8>, hold: Duration) -> Api {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");
    std::thread::spawn(move || {
        let Ok((mut socket, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(socket.try_clone().expect("Failed to clone socket"));
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(n) if n > 0 && line != "\r\n" => {}
                _ => break,
            }
        }
        let _ = socket.write_all(&response);
        let _ = socket.flush();
        std::thread::sleep(hold);
    });

    Api::builder()
        .api_server(format!("http://{addr}"))
        .access_token(SecretString::from(ACCESS_TOKEN))
        .account_id(ACCOUNT_ID)
        .allow_http()
        .build()
        .expect("Failed to build api")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
