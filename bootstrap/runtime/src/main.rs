#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    shape_dispatch_runtime::bootstrap::run().await
}
