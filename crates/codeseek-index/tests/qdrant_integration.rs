use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

use codeseek_index::document::{IndexEntry, SourceDocument, file_metadata};
use codeseek_index::store::{QdrantIndex, VectorIndex};

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn setup() -> (QdrantIndex, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    let url = format!("http://127.0.0.1:{grpc_port}");
    (QdrantIndex::new(&url, "codebase").unwrap(), container)
}

fn entry(name: &str, content: &str, embedding: Vec<f32>) -> IndexEntry {
    IndexEntry::for_document(
        &SourceDocument {
            name: name.into(),
            path: name.into(),
            content: content.into(),
        },
        embedding,
    )
}

#[tokio::test]
#[ignore = "requires docker"]
async fn upsert_replaces_and_search_ranks() {
    let (index, _container) = setup().await;

    index.upsert(entry("a.py", "old", vec![1.0, 0.0])).await.unwrap();
    index.upsert(entry("a.py", "print(1)", vec![1.0, 0.0])).await.unwrap();
    index.upsert(entry("b.py", "print(2)", vec![0.0, 1.0])).await.unwrap();

    assert_eq!(index.ids().await.unwrap(), ["a.py", "b.py"]);

    let hits = index.search(vec![0.9, 0.1], 3).await.unwrap();
    assert_eq!(hits[0].document, "print(1)");
    assert_eq!(hits[0].metadata, file_metadata("a.py"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn clear_drops_collection() {
    let (index, _container) = setup().await;

    index.upsert(entry("a.py", "print(1)", vec![1.0, 0.0])).await.unwrap();
    index.clear().await.unwrap();

    assert_eq!(index.count().await.unwrap(), 0);
    assert!(index.search(vec![1.0, 0.0], 3).await.unwrap().is_empty());
}
