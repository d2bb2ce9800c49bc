fn main() -> anyhow::Result<()> {
    wireshot::run()
}
