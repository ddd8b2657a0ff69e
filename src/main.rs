use anyhow::Result;

fn main() -> Result<()> {
    noteform::cli::run()
}
