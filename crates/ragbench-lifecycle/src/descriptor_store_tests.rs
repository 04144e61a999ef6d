use super::*;
use ragbench_protocols::BackendKind;
use tempfile::TempDir;

fn descriptor(name: &str) -> ExperimentDescriptor {
    ExperimentDescriptor::new(name, "alice", "test run", "basic_rag")
}

#[tokio::test]
async fn test_memory_store_roundtrip() {
    let store = MemoryDescriptorStore::new();
    store.save(&descriptor("exp_b")).await.unwrap();
    store.save(&descriptor("exp_a")).await.unwrap();

    let names: Vec<_> = store.list().await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["exp_a", "exp_b"]);

    assert!(store.exists("exp_a").await.unwrap());
    store.delete("exp_a").await.unwrap();
    assert!(!store.exists("exp_a").await.unwrap());
    store.delete("exp_a").await.unwrap();
}

#[tokio::test]
async fn test_memory_store_active() {
    let store = MemoryDescriptorStore::new();
    assert_eq!(store.active().await.unwrap(), None);
    store.set_active(Some("exp1")).await.unwrap();
    assert_eq!(store.active().await.unwrap().as_deref(), Some("exp1"));
    store.set_active(None).await.unwrap();
    assert_eq!(store.active().await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();

    let mut desc = descriptor("exp1");
    desc.set_exists(BackendKind::Relational, true);
    desc.add_note("baseline with chunk size 512");

    {
        let store = FileDescriptorStore::new(dir.path()).await.unwrap();
        store.save(&desc).await.unwrap();
        store.set_active(Some("exp1")).await.unwrap();
    }

    let store = FileDescriptorStore::new(dir.path()).await.unwrap();
    let loaded = store.load("exp1").await.unwrap().unwrap();
    assert_eq!(loaded, desc);
    assert_eq!(store.active().await.unwrap().as_deref(), Some("exp1"));
    assert!(dir.path().join("descriptors/exp1.yaml").exists());
}

#[tokio::test]
async fn test_file_store_load_missing() {
    let dir = TempDir::new().unwrap();
    let store = FileDescriptorStore::new(dir.path()).await.unwrap();
    assert!(store.load("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_rejects_bad_names() {
    let dir = TempDir::new().unwrap();
    let store = FileDescriptorStore::new(dir.path()).await.unwrap();
    let err = store.load("../etc").await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidName(_)));
}

#[tokio::test]
async fn test_file_store_list_skips_garbage() {
    let dir = TempDir::new().unwrap();
    let store = FileDescriptorStore::new(dir.path()).await.unwrap();
    store.save(&descriptor("exp2")).await.unwrap();
    store.save(&descriptor("exp1")).await.unwrap();
    std::fs::write(dir.path().join("descriptors/broken.yaml"), ": : :").unwrap();
    std::fs::write(dir.path().join("descriptors/readme.txt"), "ignored").unwrap();

    let names: Vec<_> = store.list().await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["exp1", "exp2"]);
}

#[tokio::test]
async fn test_file_store_clear_active() {
    let dir = TempDir::new().unwrap();
    let store = FileDescriptorStore::new(dir.path()).await.unwrap();
    store.set_active(None).await.unwrap();
    store.set_active(Some("exp1")).await.unwrap();
    store.set_active(None).await.unwrap();
    assert_eq!(store.active().await.unwrap(), None);
}
