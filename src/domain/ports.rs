use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// 外部的影像生成 / 視覺模型服務
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// 送出一張圖與指令，回傳模型合成的新圖
    async fn edit(&self, image: &[u8], instruction: &str) -> Result<Vec<u8>>;

    /// 送出兩張圖與指令，回傳模型的原始文字回覆
    async fn compare(&self, image_a: &[u8], image_b: &[u8], instruction: &str) -> Result<String>;
}

#[async_trait]
pub trait MapImagery: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}
