fn main() -> anyhow::Result<()> {
    jarscope_cli::run()
}
