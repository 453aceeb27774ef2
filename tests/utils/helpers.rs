/// Test helper builders: in-memory services wired the way the binary wires
/// the real ones, plus fixtures shared across the integration tests.
use bytes::Bytes;
use cutout::modules::pipeline::{ImageProcessor, PipelineConfig};
use cutout::modules::records::{InMemoryTaskRecordStore, TaskRecordStore};
use cutout::modules::removebg::BackgroundRemover;
use cutout::modules::storage::{InMemoryObjectStore, ObjectStore};
use cutout::modules::uploads::{UploadTracker, Uploader};
use cutout::shared::errors::AppResult;
use mockall::mock;
use std::sync::Arc;

pub const TEST_BASE_URL: &str = "https://stub.supabase.co";
pub const TEST_BUCKET: &str = "images";

mock! {
    pub Remover {}

    #[async_trait::async_trait]
    impl BackgroundRemover for Remover {
        async fn remove_background(&self, image_url: &str) -> AppResult<Bytes>;
    }
}

pub struct TestServices {
    pub records: Arc<InMemoryTaskRecordStore>,
    pub storage: Arc<InMemoryObjectStore>,
    pub tracker: Arc<UploadTracker>,
}

impl TestServices {
    pub fn uploader(&self) -> Uploader {
        Uploader::new(
            self.storage.clone(),
            self.records.clone(),
            Arc::clone(&self.tracker),
        )
    }

    pub fn processor(&self, remover: MockRemover, config: PipelineConfig) -> ImageProcessor {
        self.processor_with(Arc::new(remover), config)
    }

    pub fn processor_with(
        &self,
        remover: Arc<dyn BackgroundRemover>,
        config: PipelineConfig,
    ) -> ImageProcessor {
        let records: Arc<dyn TaskRecordStore> = self.records.clone();
        let storage: Arc<dyn ObjectStore> = self.storage.clone();
        ImageProcessor::new(records, storage, remover, config)
    }
}

/// Build the in-memory service set used by every integration test.
pub fn build_test_services() -> TestServices {
    TestServices {
        records: Arc::new(InMemoryTaskRecordStore::new()),
        storage: Arc::new(InMemoryObjectStore::new(TEST_BASE_URL, TEST_BUCKET)),
        tracker: Arc::new(UploadTracker::new()),
    }
}

/// A valid 2x2 PNG for pipeline fixtures.
pub fn tiny_png() -> Bytes {
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])));
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .expect("encoding a fixture PNG cannot fail");
    Bytes::from(cursor.into_inner())
}

/// JSON body of a storage webhook delivery.
pub fn storage_event(kind: &str, name: &str, bucket: &str) -> Vec<u8> {
    serde_json::json!({
        "type": kind,
        "record": { "id": "obj-1", "name": name, "bucket_id": bucket }
    })
    .to_string()
    .into_bytes()
}
