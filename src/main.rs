fn main() -> anyhow::Result<()> {
    sereno_lib::run()
}
