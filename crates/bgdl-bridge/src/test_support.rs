//! Mock native port for unit tests.

use async_trait::async_trait;
use bgdl_core::{NativeDownloadInfo, NativeDownloaderPort, NativeError, NativeStartRequest};

mockall::mock! {
    pub Native {}

    #[async_trait]
    impl NativeDownloaderPort for Native {
        fn start_download(&self, request: NativeStartRequest) -> Result<(), NativeError>;
        fn pause(&self, id: &str) -> Result<(), NativeError>;
        fn resume(&self, id: &str) -> Result<(), NativeError>;
        fn stop(&self, id: &str) -> Result<(), NativeError>;
        async fn list_existing_downloads(&self) -> Result<Vec<NativeDownloadInfo>, NativeError>;
        async fn acknowledge_completion(&self, id: &str) -> Result<(), NativeError>;
    }
}
