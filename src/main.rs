use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = img_relocate::cli::parse();
    app::run(args)
}
