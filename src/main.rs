fn main() -> anyhow::Result<()> {
    firefly_grove::scene::run()
}
