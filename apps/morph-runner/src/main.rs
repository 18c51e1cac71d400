fn main() -> anyhow::Result<()> {
    morph_runner::run()
}
