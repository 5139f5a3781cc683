use std::error::Error;
use std::time::Duration;

use cubetest::{BoxError, ClientInput, DockerClient, Port, PublicPort};
use tokio::net::TcpStream;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_IMAGE: &str = "nginx:mainline-alpine";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = DockerClient::new()?;

    let mut input = ClientInput::new(DEMO_IMAGE);
    input
        .ports
        .add(Port::tcp(80).with_public(PublicPort::Random));

    let mut service = client
        .service(input)
        .with_name("nginx")
        .with_ping(|ping| async move {
            let port = ping.container.port(80)?;
            let public = port.public.ok_or("port 80 is not published")?;
            loop {
                match TcpStream::connect(("127.0.0.1", public)).await {
                    Ok(_) => return Ok::<(), BoxError>(()),
                    Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
                }
            }
        });

    service.run().await?;

    if let Some(container) = service.container() {
        info!(container = %container, "service ready");
        let port = container.port(80)?;
        println!("{}:{}", port.address, port.public.unwrap_or_default());
        println!("{}", serde_json::to_string_pretty(&container.ports())?);
    }

    service.terminate().await?;
    Ok(())
}
