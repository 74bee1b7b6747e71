use vergen::{BuildBuilder, Emitter};
use vergen_git2::Git2Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let git2 = Git2Builder::default().describe(true, true, None).sha(true).build();

    match git2 {
        Ok(git2) => {
            Emitter::default()
                .add_instructions(&build)?
                .add_instructions(&git2)?
                .emit()?;
        }
        Err(_) => {
            // Source tarballs have no git metadata.
            println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
            println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
            Emitter::default().add_instructions(&build)?.emit()?;
        }
    }

    Ok(())
}
