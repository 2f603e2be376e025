use quizforge_backend::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    services::user_service::UserService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [username, password] = args.as_slice() else {
        eprintln!("Usage: create_admin <username> <password>");
        std::process::exit(1);
    };

    let config = Config::from_env()?;
    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let users = UserService::new(pool, config.pepper_bytes());
    let (user, created) = users.upsert_admin(username.trim(), password).await?;

    if created {
        println!("Admin user '{}' created successfully!", user.username);
    } else {
        println!("User '{}' already existed and is now an admin.", user.username);
    }
    Ok(())
}
