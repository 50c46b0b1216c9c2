mod event;

use std::sync::Arc;
use std::time::Duration;

use event::{InputEvent, LineReader};
use sprout_core::config::SproutCfg;
use sprout_core::runtime::Pipeline;
use sprout_core::session::Session;
use sprout_core::types::Reply;
use sprout_llm::provider::LlmProvider;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const PROMPT: &str = "You> ";
const ESCALATION_PROMPT: &str = "Type 'yes' to involve a parent, or 'no' to continue: ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    const DB_CONNECT_TIMEOUT_SECS: u64 = 3;

    // Tracing: write to file when RUST_LOG is set so logs don't interleave with the prompt
    if std::env::var("RUST_LOG").is_ok() {
        let file = std::fs::File::create("/tmp/sprout.log")?;
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(fmt::layer().json().with_target(true).with_writer(file))
            .init();
    }

    // DATABASE_URL is optional; without it the defaults are used
    let mut startup_notice: Option<String> = None;
    let pool = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let connect_result = tokio::time::timeout(
                Duration::from_secs(DB_CONNECT_TIMEOUT_SECS),
                sqlx::postgres::PgPoolOptions::new().max_connections(2).connect(&url),
            )
            .await;

            match connect_result {
                Ok(Ok(pool)) => match sqlx::migrate!("../../migrations").run(&pool).await {
                    Ok(()) => {
                        tracing::info!("database connected and migrations applied");
                        Some(pool)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "database migration failed, using default config");
                        startup_notice = Some("(Database migration failed; running with default settings.)".to_string());
                        None
                    }
                },
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "failed to connect DATABASE_URL, using default config");
                    startup_notice = Some("(Could not connect to DATABASE_URL; running with default settings.)".to_string());
                    None
                }
                Err(_) => {
                    tracing::warn!(timeout_secs = DB_CONNECT_TIMEOUT_SECS, "database connect timed out, using default config");
                    startup_notice = Some(format!(
                        "(Database connect timed out after {DB_CONNECT_TIMEOUT_SECS}s; running with default settings.)"
                    ));
                    None
                }
            }
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using default config");
            None
        }
    };

    if let Some(notice) = &startup_notice {
        println!("{notice}");
    }

    let cfg = match pool {
        Some(ref pool) => SproutCfg::load(pool).await?,
        None => SproutCfg::default(),
    };
    let cfg = Arc::new(cfg);

    let llm: Option<Arc<dyn LlmProvider>> = sprout_llm::http::from_env().map(|p| {
        tracing::info!(name = p.name(), "LLM provider initialized");
        Arc::new(p) as _
    });
    if llm.is_none() {
        println!("(No SPROUT_LLM_MODEL configured; replies will be limited.)");
    }

    let pipeline = Pipeline::new(cfg, llm);
    let mut session = pipeline.new_session();

    let token = CancellationToken::new();
    spawn_sigint_canceler(token.clone());

    let mut reader = LineReader::spawn();

    if onboard(&mut reader, &mut session, &token).await {
        chat(&mut reader, &pipeline, &mut session, &token).await;
    }

    println!("Bye for now! See you next time!");
    tracing::info!(
        session = %session.id(),
        interactions = session.interaction_count(),
        points = session.points(),
        "session closed"
    );
    Ok(())
}

/// Ask for name and favorite theme until both are given. Returns false if
/// the child left before finishing.
async fn onboard(reader: &mut LineReader, session: &mut Session, token: &CancellationToken) -> bool {
    loop {
        let InputEvent::Line(name) = reader.read("Hi! What's your name? ", token).await else {
            return false;
        };
        let InputEvent::Line(theme) = reader
            .read("What's your favorite thing, like animals or superheroes? ", token)
            .await
        else {
            return false;
        };
        match session.set_profile(&name, &theme) {
            Ok(welcome) => {
                println!("{welcome}");
                return true;
            }
            Err(e) => {
                tracing::debug!(error = %e, "onboarding input rejected");
                println!("Oops, I need both a name and a favorite thing. Let's try again!");
            }
        }
    }
}

async fn chat(reader: &mut LineReader, pipeline: &Pipeline, session: &mut Session, token: &CancellationToken) {
    println!("Ask me anything! Commands: /points, /clear, /end, exit");
    loop {
        let line = match reader.read(PROMPT, token).await {
            InputEvent::Line(line) => line,
            InputEvent::Interrupted | InputEvent::Eof => return,
        };

        match line.trim() {
            "exit" | "/quit" => return,
            "/clear" => {
                session.clear_history();
                println!("sprout: I cleared our chat history. Fresh start!");
                continue;
            }
            "/end" => {
                session.end_session();
                println!("sprout: Session ended. Points and chats are reset.");
                continue;
            }
            "/points" => {
                println!("sprout: You have {} points.", session.points());
                continue;
            }
            _ => {}
        }

        let reply = tokio::select! {
            _ = token.cancelled() => return,
            reply = pipeline.process_message(session, &line) => reply,
        };
        print_reply(&reply);

        if reply.escalation {
            match reader.read(ESCALATION_PROMPT, token).await {
                InputEvent::Line(answer) if answer.trim().eq_ignore_ascii_case("yes") => {
                    println!("sprout: {}", pipeline.confirm_parent_handoff(session));
                }
                InputEvent::Line(_) => {
                    let reply = tokio::select! {
                        _ = token.cancelled() => return,
                        reply = pipeline.continue_after_escalation(session) => reply,
                    };
                    print_reply(&reply);
                }
                InputEvent::Interrupted | InputEvent::Eof => return,
            }
        }
    }
}

fn spawn_sigint_canceler(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            if let Ok(mut sigint) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            {
                let _ = sigint.recv().await;
                tracing::info!("SIGINT received");
                token.cancel();
            }
        }
        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });
}

fn print_reply(reply: &Reply) {
    for line in &reply.responses {
        println!("{}: {}", line.sender, line.text);
    }
}
