//!
//! money CLI binary
//! ----------------
//! Logs into the money dashboard API, bootstraps the session (profile, roles,
//! password prompts, license advisory) and prints it. Also handles server
//! and local logout, captcha download and the menu tree.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use money_console::api::{ApiClient, LoginForm};
use money_console::cli::{default_role_notice, format_routers, format_session};
use money_console::config::ClientConfig;
use money_console::identity::{FileTokenStore, SessionController};
use money_console::notify::{ConsoleNavigator, ConsolePresenter};
use money_console::AppError;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --user <u> --password <p> [--code <captcha> --uuid <id>] [--base <url>] [--routers]\n  {program} --captcha-out <file> [--base <url>]\n  {program} --status [--routers]\n  {program} --logout\n  {program} --local-logout\n\nFlags:\n  --base <url>             API base URL (env MONEY_BASE_API, default http://localhost:8085)\n  --token-file <path>      Where the session token is kept (env MONEY_TOKEN_FILE, default .money/token)\n  --timeout <secs>         Request timeout (env MONEY_HTTP_TIMEOUT_SECS)\n  --user <u>               Username to log in with\n  --password <p>           Password\n  --code <c>               Captcha answer\n  --uuid <id>              Captcha id printed by --captcha-out\n  --captcha-out <file>     Fetch a captcha, write the image to <file> and print its id\n  --status                 Load the profile for the stored token\n  --routers                Also print the menu entries the session is permitted to see\n  --logout                 Log out on the server and forget the token\n  --local-logout           Forget the token without contacting the server\n  --non-interactive        Decline prompts instead of reading answers from stdin\n  -h, --help               Show this help"
    );
}

fn take_value(args: &[String], i: usize, flag: &str, program: &str) -> String {
    if i + 1 >= args.len() {
        eprintln!("{} requires a value", flag);
        print_usage(program);
        std::process::exit(2);
    }
    args[i + 1].clone()
}

#[derive(Default)]
struct Opts {
    base: Option<String>,
    token_file: Option<String>,
    timeout: Option<String>,
    user: Option<String>,
    password: Option<String>,
    code: String,
    uuid: String,
    captcha_out: Option<String>,
    status: bool,
    routers: bool,
    logout: bool,
    local_logout: bool,
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow!("invalid log filter: {}", e))?;
    fmt().with_env_filter(filter).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    let mut opts = Opts { interactive: true, ..Default::default() };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--base" => { opts.base = Some(take_value(&args, i, "--base", &program)); i += 2; continue; }
            "--token-file" => { opts.token_file = Some(take_value(&args, i, "--token-file", &program)); i += 2; continue; }
            "--timeout" => { opts.timeout = Some(take_value(&args, i, "--timeout", &program)); i += 2; continue; }
            "--user" => { opts.user = Some(take_value(&args, i, "--user", &program)); i += 2; continue; }
            "--password" => { opts.password = Some(take_value(&args, i, "--password", &program)); i += 2; continue; }
            "--code" => { opts.code = take_value(&args, i, "--code", &program); i += 2; continue; }
            "--uuid" => { opts.uuid = take_value(&args, i, "--uuid", &program); i += 2; continue; }
            "--captcha-out" => { opts.captcha_out = Some(take_value(&args, i, "--captcha-out", &program)); i += 2; continue; }
            "--status" => { opts.status = true; i += 1; continue; }
            "--routers" => { opts.routers = true; i += 1; continue; }
            "--logout" => { opts.logout = true; i += 1; continue; }
            "--local-logout" => { opts.local_logout = true; i += 1; continue; }
            "--non-interactive" => { opts.interactive = false; i += 1; continue; }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            other => {
                eprintln!("unknown argument: {}", other);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    if let Err(e) = run(opts).await {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run(opts: Opts) -> Result<(), AppError> {
    let mut cfg = ClientConfig::from_env()?;
    if let Some(b) = opts.base { cfg.base_api = b; }
    if let Some(t) = opts.token_file { cfg.token_file = PathBuf::from(t); }
    if let Some(secs) = opts.timeout {
        let n: u64 = secs.parse().map_err(|_| AppError::user("invalid_timeout".to_string(), format!("--timeout expects seconds, got '{}'", secs)))?;
        cfg.timeout = Some(Duration::from_secs(n));
    }
    info!(target: "money::cli", "money cli starting: base_api='{}', token_file='{}'", cfg.base_api, cfg.token_file.display());

    let api = ApiClient::new(&cfg)?;
    let mut ctl = SessionController::new(
        api,
        Box::new(FileTokenStore::new(cfg.token_file.clone())),
        Arc::new(ConsolePresenter::new(opts.interactive)),
        Arc::new(ConsoleNavigator),
        &cfg,
    );

    if opts.local_logout {
        ctl.fed_logout();
        println!("local session cleared");
        return Ok(());
    }
    if opts.logout {
        ctl.logout().await?;
        println!("logged out");
        return Ok(());
    }
    if let Some(out) = opts.captcha_out {
        write_captcha(ctl.backend(), &out).await.map_err(|e| AppError::io("captcha_write".to_string(), format!("{:#}", e)))?;
        return Ok(());
    }

    if let Some(user) = opts.user {
        let password = opts.password.ok_or_else(|| AppError::user("missing_password", "--password is required with --user"))?;
        ctl.login(LoginForm::new(user, password, opts.code, opts.uuid)).await?;
    } else if !opts.status {
        return Err(AppError::user("nothing_to_do", "pass --user/--password, --status, --logout or --local-logout"));
    }

    if !ctl.session().is_logged_in() {
        return Err(AppError::auth("not_logged_in", "no stored token; log in with --user/--password"));
    }
    match ctl.get_info().await {
        Ok(_) => {}
        Err(e) if e.is_session_expired() => {
            warn!(target: "money::cli", "stored token rejected, clearing local session");
            ctl.fed_logout();
            return Err(e);
        }
        Err(e) => return Err(e),
    }
    if let Some(notice) = default_role_notice(ctl.session()) {
        warn!(target: "money::cli", "{}", notice);
    }
    println!("{}", format_session(ctl.session()));

    if opts.routers {
        let token = ctl.session().token.clone();
        let routers = ctl.backend().get_routers(&token).await?;
        println!("{}", format_routers(&routers, ctl.session()));
    }
    Ok(())
}

async fn write_captcha(api: &ApiClient, out: &str) -> Result<()> {
    let captcha = api.captcha_image().await?;
    if !captcha.captcha_enabled {
        println!("captcha disabled on this server; log in without --code/--uuid");
        return Ok(());
    }
    let img = captcha.img.ok_or_else(|| anyhow!("captcha response carried no image"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(img.trim())
        .context("captcha image is not valid base64")?;
    fs::write(out, bytes).with_context(|| format!("writing {}", out))?;
    println!("captcha written to {}; uuid={}", out, captcha.uuid.unwrap_or_default());
    Ok(())
}
