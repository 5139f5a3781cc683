//! Tests against a real Docker daemon. Run with `--ignored`.

use std::time::Duration;

use cubetest::{BoxError, ClientInput, DockerClient, Error, Port, PublicPort};
use tokio::net::TcpStream;

const TEST_IMAGE: &str = "nginx:mainline-alpine";

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_run_and_remove_container() {
    let client = DockerClient::new().unwrap();

    let mut info = client.run_container(&ClientInput::new(TEST_IMAGE)).await.unwrap();
    info.refresh(&client).await.unwrap();
    assert_eq!(info.image(), TEST_IMAGE);

    client.remove_container(info.id()).await.unwrap();
    client.remove_container(info.id()).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_run_container_attempts_to_pull_image() {
    let client = DockerClient::new().unwrap();
    let input = ClientInput::new("988881adc9fc3655077dc2d4d757d480b5ea0e11");

    let err = client.run_container(&input).await.unwrap_err();
    assert!(err.to_string().contains("does not exist"), "got: {}", err);
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_container_info_unknown_id() {
    let client = DockerClient::new().unwrap();
    let err = client.container_info("foobar").await.unwrap_err();
    assert!(matches!(err, Error::ContainerNotFound(_)));
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_service_with_tcp_ping() {
    let client = DockerClient::new().unwrap();
    let mut input = ClientInput::new(TEST_IMAGE);
    input
        .ports
        .add(Port::tcp(80).with_public(PublicPort::Random));

    let mut service = client.service(input).with_ping(|ping| async move {
        let port = ping.container.port(80)?;
        let public = port.public.ok_or("port 80 is not published")?;
        loop {
            if TcpStream::connect(("127.0.0.1", public)).await.is_ok() {
                return Ok::<(), BoxError>(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    service.run().await.unwrap();
    service.terminate().await.unwrap();
}
