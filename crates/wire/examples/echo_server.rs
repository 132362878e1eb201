use std::sync::Arc;
use std::time::Duration;

use http::{Response, StatusCode, header};
use micro_wire::connection::{MessageReader, ReadConfig, ResponseStream, SharedResponse};
use micro_wire::protocol::HttpError;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let reader = MessageReader::new(ReadConfig::default().with_timeout(Duration::from_secs(10)));

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            match echo(reader, tcp_stream).await {
                Ok(()) => info!(%remote_addr, "finished echo, connection shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "echo failed, connection shutdown"),
            }
        });
    }
}

/// Answers one request with its own body, sent in chunks.
async fn echo(reader: MessageReader, mut tcp_stream: TcpStream) -> Result<(), HttpError> {
    let request = reader.read_request(&mut tcp_stream).await?;
    info!(method = %request.head().method(), path = request.head().uri().path(), "receiving request");

    let text = request.entity_body()?.into_owned();
    info!(body = %text, "decoded request body");

    let head = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(())
        .expect("static response head should be valid");
    let response = Arc::new(SharedResponse::chunked(head));

    let mut body = ResponseStream::new(&mut tcp_stream, response);
    for line in text.lines() {
        body.write(line.as_bytes()).await?;
        body.write(b"\r\n").await?;
    }
    body.close().await?;
    Ok(())
}
