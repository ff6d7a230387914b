#[tokio::main]
async fn main() -> anyhow::Result<()> {
    exercise_trainer::run().await
}
