use std::io::{Read, Write};

use anyhow::Context;
use bucketfs_core::{normalize, ObjectClient, OpenMode, Storage};
use bucketfs_store::DiskObjectClient;
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::resolve(&cli)?;
    let client = DiskObjectClient::open(&config.store)
        .with_context(|| format!("opening bucket {:?}", config.store.bucket))?;
    debug!(
        root = %config.store.root.display(),
        bucket = %config.store.bucket,
        "opened bucket"
    );
    let storage = Storage::with_config(client, config.fs);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    execute(
        &storage,
        cli.command,
        cli.format,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )
}

/// Run one command against `storage`, reading uploads from `input` and
/// writing results to `out`.
pub fn execute<C: ObjectClient>(
    storage: &Storage<C>,
    command: Command,
    format: OutputFormat,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Put(args) => cmd_put(storage, args, input, out),
        Command::Cat(args) => cmd_cat(storage, args, out),
        Command::Rm(args) => cmd_rm(storage, args, out),
        Command::Ls(args) => cmd_ls(storage, args, format, out),
        Command::Mkdir(args) => {
            storage.make_directory(&args.path)?;
            writeln!(out, "{} Created {}", "✓".green(), normalize(&args.path).bold())?;
            Ok(())
        }
        Command::Mv(args) => cmd_mv(storage, args, out),
        Command::Rmtree(args) => {
            let removed = storage.remove_tree(&args.path)?;
            writeln!(out, "{} Removed {removed} objects under {}", "✓".green(), args.path.bold())?;
            Ok(())
        }
        Command::Stat(args) => cmd_stat(storage, args, format, out),
        Command::Url(args) => {
            writeln!(out, "{}", storage.url(&args.path))?;
            Ok(())
        }
        Command::Exists(args) => cmd_exists(storage, args, format, out),
    }
}

fn cmd_put<C: ObjectClient>(
    storage: &Storage<C>,
    args: PutArgs,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let data = match &args.from {
        Some(path) => std::fs::read(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            input.read_to_end(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let key = storage.save(&args.path, &data)?;
    writeln!(out, "{} Stored {} ({} bytes)", "✓".green(), key.bold(), data.len())?;
    Ok(())
}

fn cmd_cat<C: ObjectClient>(
    storage: &Storage<C>,
    args: CatArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut handle = storage.open(&args.path, OpenMode::READ);
    loop {
        let part = handle.read(Some(args.chunk.max(1)))?;
        if part.is_empty() {
            break;
        }
        out.write_all(&part)?;
    }
    handle.close()?;
    Ok(())
}

fn cmd_rm<C: ObjectClient>(
    storage: &Storage<C>,
    args: PathArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if storage.delete(&args.path)? {
        writeln!(out, "{} Deleted {}", "✓".green(), normalize(&args.path).bold())?;
    } else {
        writeln!(out, "{} No such file: {}", "!".yellow(), args.path)?;
    }
    Ok(())
}

fn cmd_ls<C: ObjectClient>(
    storage: &Storage<C>,
    args: LsArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let listing = storage.list_directory(&args.path)?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&listing)?)?,
        OutputFormat::Text => {
            for dir in &listing.directories {
                writeln!(out, "{}/", dir.blue().bold())?;
            }
            for file in &listing.files {
                writeln!(out, "{file}")?;
            }
        }
    }
    Ok(())
}

fn cmd_mv<C: ObjectClient>(
    storage: &Storage<C>,
    args: MvArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    storage.move_path(&args.from, &args.to, args.force)?;
    writeln!(
        out,
        "{} Moved {} → {}",
        "✓".green(),
        normalize(&args.from).bold(),
        normalize(&args.to).bold()
    )?;
    Ok(())
}

fn cmd_stat<C: ObjectClient>(
    storage: &Storage<C>,
    args: PathArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let meta = storage.stat(&args.path)?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&meta)?)?,
        OutputFormat::Text => {
            writeln!(out, "{}", meta.key.bold())?;
            writeln!(out, "  Size: {} bytes", meta.size)?;
            writeln!(
                out,
                "  Type: {}",
                meta.content_type.as_deref().unwrap_or("(none)").cyan()
            )?;
            writeln!(out, "  Modified: {}", meta.last_modified.to_rfc3339())?;
        }
    }
    Ok(())
}

fn cmd_exists<C: ObjectClient>(
    storage: &Storage<C>,
    args: PathArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let kind = if storage.is_file(&args.path)? {
        "file"
    } else if storage.is_dir(&args.path)? {
        "directory"
    } else {
        "missing"
    };
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({ "path": args.path, "kind": kind }))?,
        OutputFormat::Text => writeln!(out, "{kind}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketfs_store::InMemoryObjectClient;
    use clap::Parser;

    fn run(storage: &Storage<InMemoryObjectClient>, args: &[&str], stdin: &[u8]) -> String {
        colored::control::set_override(false);
        let argv = std::iter::once("bucketfs").chain(args.iter().copied());
        let cli = Cli::parse_from(argv);
        let mut input = stdin;
        let mut out = Vec::new();
        execute(storage, cli.command, cli.format, &mut input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn storage() -> Storage<InMemoryObjectClient> {
        Storage::new(InMemoryObjectClient::new())
    }

    #[test]
    fn put_from_stdin_then_cat() {
        let storage = storage();
        let out = run(&storage, &["put", "/docs/readme.md"], b"# hello\n");
        assert!(out.contains("docs/readme.md"));
        assert!(out.contains("8 bytes"));

        let out = run(&storage, &["cat", "docs/readme.md", "--chunk", "3"], b"");
        assert_eq!(out, "# hello\n");
    }

    #[test]
    fn put_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.txt");
        std::fs::write(&local, "from disk").unwrap();

        let storage = storage();
        run(&storage, &["put", "up.txt", "--from", local.to_str().unwrap()], b"");
        assert_eq!(run(&storage, &["cat", "up.txt"], b""), "from disk");
    }

    #[test]
    fn ls_text_and_json() {
        let storage = storage();
        storage.save("dir/a.txt", b"a").unwrap();
        storage.save("dir/sub/b.txt", b"b").unwrap();

        let text = run(&storage, &["ls", "dir"], b"");
        assert_eq!(text, "sub/\na.txt\n");

        let json = run(&storage, &["--format", "json", "ls", "dir"], b"");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"], json!(["a.txt"]));
        assert_eq!(value["directories"], json!(["sub"]));
    }

    #[test]
    fn mkdir_mv_rmtree() {
        let storage = storage();
        run(&storage, &["mkdir", "empty"], b"");
        assert_eq!(run(&storage, &["exists", "empty"], b""), "directory\n");

        storage.save("empty/x.txt", b"x").unwrap();
        run(&storage, &["mv", "empty", "full"], b"");
        assert_eq!(run(&storage, &["exists", "empty"], b""), "missing\n");
        assert_eq!(run(&storage, &["exists", "full/x.txt"], b""), "file\n");

        let out = run(&storage, &["rmtree", "full"], b"");
        assert!(out.contains("Removed 2 objects"));
        assert!(storage.client().is_empty());
    }

    #[test]
    fn mv_conflict_needs_force() {
        let storage = storage();
        storage.save("a.txt", b"a").unwrap();
        storage.save("b.txt", b"b").unwrap();

        let cli = Cli::parse_from(["bucketfs", "mv", "a.txt", "b.txt"]);
        let err = execute(&storage, cli.command, cli.format, &mut &b""[..], &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("exists"));

        run(&storage, &["mv", "a.txt", "b.txt", "--force"], b"");
        assert_eq!(run(&storage, &["cat", "b.txt"], b""), "a");
    }

    #[test]
    fn stat_and_url() {
        let storage = storage();
        storage.save("pic.png", b"1234").unwrap();

        let out = run(&storage, &["stat", "pic.png"], b"");
        assert!(out.contains("Size: 4 bytes"));
        assert!(out.contains("image/png"));

        let json = run(&storage, &["--format", "json", "stat", "pic.png"], b"");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["size"], json!(4));

        assert_eq!(run(&storage, &["url", "/pic.png"], b""), "memory://bucket/pic.png\n");
    }

    #[test]
    fn stat_of_missing_file_fails() {
        let storage = storage();
        let cli = Cli::parse_from(["bucketfs", "stat", "ghost.txt"]);
        let err = execute(&storage, cli.command, cli.format, &mut &b""[..], &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("not found: ghost.txt"));
    }

    #[test]
    fn rm_reports_missing() {
        let storage = storage();
        let out = run(&storage, &["rm", "ghost.txt"], b"");
        assert!(out.contains("No such file"));
    }
}
