//! enroll-admin - enroll a Fabric identity and store it in a wallet.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fabric_enroll_cli::run().await
}
