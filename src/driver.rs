use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::Command,
    sync::Arc,
};

use crate::{
    Cli, codegen,
    error::{InternalError, ariadne_renderer::AriadneRenderer, context::Context},
    ingest,
    transpile::{self, Options},
};

/// Run the translation.
pub fn run(config: Cli) -> Result<(), InternalError> {
    let mut ctx = Context::init(Box::new(AriadneRenderer::new()));

    if let Some(input) = &config.input {
        if !input.exists() {
            return Err(InternalError::MissingInput(input.clone()));
        }
        ctx.add_source(Arc::from(input.to_string_lossy().as_ref()), fs::read_to_string(input)?);
    }

    let dump = match &config.from_dump {
        Some(path) => {
            if !path.exists() {
                return Err(InternalError::MissingInput(path.clone()));
            }
            log::info!("reading AST dump from {}", path.display());
            fs::read_to_string(path)?
        }
        None => {
            let input = config
                .input
                .as_deref()
                .ok_or_else(|| InternalError::MissingInput(PathBuf::from("<INPUT>")))?;
            dump_ast(&mut ctx, &config.clang, input)?
        }
    };

    if config.print_ast {
        print!("{}", dump);
        return ctx.finish();
    }

    log::info!("ingesting the AST dump");
    let root = match ingest::parse_dump(&dump) {
        Ok(root) => root,
        Err(err) => {
            ctx.finish()?;
            return Err(err.into());
        }
    };

    log::info!("translating");
    let options = Options {
        package: config.package.clone(),
        runtime: config.runtime.clone(),
    };
    let file = match transpile::translate(&mut ctx, &root, &options) {
        Ok(file) => file,
        Err(err) => {
            ctx.finish()?;
            return Err(err);
        }
    };

    let output = output_path(&config);
    log::info!("writing {}", output.display());
    let mut w = BufWriter::new(fs::File::create(&output)?);
    codegen::emit_code(&file, &mut w)?;
    w.flush()?;

    if ctx.error_count() > 0 {
        log::warn!(
            "{} declarations or statements were replaced by comments",
            ctx.error_count()
        );
    }
    ctx.finish()
}

/// `-o`, or the input (or dump) path with a `.go` extension.
fn output_path(config: &Cli) -> PathBuf {
    if let Some(output) = &config.output {
        return output.clone();
    }
    let base = config
        .input
        .as_ref()
        .or(config.from_dump.as_ref())
        .map(|p| p.with_extension("go"));
    base.unwrap_or_else(|| PathBuf::from("out.go"))
}

/// Preprocess `input` and dump the AST of the result.
///
/// The preprocessed text is kept in `ctx` for positions which point into it.
fn dump_ast(ctx: &mut Context, clang: &str, input: &Path) -> Result<String, InternalError> {
    let preprocessed = tempfile::Builder::new()
        .prefix("ctogo-")
        .suffix(".c")
        .tempfile()?;

    let mut pp = Command::new(clang);
    pp.arg("-E").arg(input);
    let text = run_compiler(pp)?;
    fs::write(preprocessed.path(), &text)?;
    ctx.add_source(
        Arc::from(preprocessed.path().to_string_lossy().as_ref()),
        String::from_utf8_lossy(&text).into_owned(),
    );

    let mut dump = Command::new(clang);
    dump.args(["-Xclang", "-ast-dump", "-fsyntax-only", "-fno-color-diagnostics"])
        .arg(preprocessed.path());
    let text = run_compiler(dump)?;
    Ok(String::from_utf8_lossy(&text).into_owned())
}

fn run_compiler(mut cmd: Command) -> Result<Vec<u8>, InternalError> {
    let command = format!("{:?}", cmd);
    log::debug!("running {}", command);
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(InternalError::Compiler {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}
