use std::{path::PathBuf, process, sync::Arc};

use postdeck::{
    application::{
        bootstrap::{
            CAMERA_SCANNING, CAMERA_STARTING, CREDENTIALS_VERIFIED, IMAGE_PROCESSING, QrBootstrap,
        },
        console::{Console, DeleteOutcome},
        editor::PostEditForm,
        error::AppError,
        session::AppContext,
    },
    config::{self, Command, GalleryArgs, LoginArgs, PostsCommand, Settings},
    domain::{error::DomainError, uploads::ImageFile},
    infra::{
        clients::RemoteClientFactory, credentials::FileCredentialStore, qr::FrameScanner,
        telemetry,
    },
    presentation::{browse, gallery, terminal::Terminal, views},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, needs_login = error.needs_login(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Login(args) => run_login(&settings, args).await,
        Command::Posts(command) => run_posts(&settings, command).await,
        Command::Gallery(args) => run_gallery(&settings, args).await,
        Command::Browse => run_browse(&settings).await,
    }
}

fn app_context(settings: &Settings) -> Result<AppContext, AppError> {
    let store = Arc::new(FileCredentialStore::new(&settings.credentials.path));
    let factory = Arc::new(RemoteClientFactory::new(
        settings.data_store.clone(),
        settings.image_host.clone(),
    )?);
    Ok(AppContext::new(store, factory))
}

/// Console over the stored session; fails with `NotLoggedIn` before the first login.
fn connect(settings: &Settings, terminal: Arc<Terminal>) -> Result<Console, AppError> {
    let mut ctx = app_context(settings)?;
    let session = ctx.resume()?.ok_or(AppError::NotLoggedIn)?;
    Ok(Console::new(session, terminal, settings.data_store.page_size))
}

async fn run_login(settings: &Settings, args: LoginArgs) -> Result<(), AppError> {
    let mut ctx = app_context(settings)?;
    let terminal = Terminal::stdio();
    let scanner = match &args.frames {
        Some(dir) => FrameScanner::with_frames_dir(dir),
        None => FrameScanner::files_only(),
    };
    let mut flow = QrBootstrap::new(
        scanner,
        ctx.credential_slot(),
        settings.scanner.scan_config(),
    );

    let outcome = match (&args.image, &args.frames) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(path).await?;
            terminal.notice(IMAGE_PROCESSING)?;
            flow.scan_image(&bytes).await
        }
        (None, Some(dir)) => {
            terminal.notice(CAMERA_STARTING)?;
            info!(frames = %dir.display(), "waiting for a QR frame");
            terminal.notice(CAMERA_SCANNING)?;
            flow.run_camera().await
        }
        (None, None) => return Err(AppError::unexpected("login needs --image or --frames")),
    };
    flow.shutdown().await;

    let payload = match outcome {
        Ok(payload) => payload,
        Err(err) => {
            if let Some(message) = views::bootstrap_status(flow.phase()) {
                terminal.notice(message)?;
            }
            return Err(err.into());
        }
    };

    ctx.initialize(&payload)?;
    terminal.notice(CREDENTIALS_VERIFIED)?;
    terminal.print(&format!(
        "credentials saved to {}",
        settings.credentials.path.display()
    ))?;
    Ok(())
}

async fn run_posts(settings: &Settings, command: PostsCommand) -> Result<(), AppError> {
    let assume_yes = matches!(&command, PostsCommand::Delete(args) if args.yes);
    let terminal = Arc::new(Terminal::stdio().assume_yes(assume_yes));
    let mut console = connect(settings, terminal.clone())?;

    match command {
        PostsCommand::List(args) => {
            console.load_page_at(args.page).await?;
            terminal.print(&views::page(console.posts(), console.cursor()))?;
        }
        PostsCommand::Create(args) => {
            let mut form = PostEditForm::blank();
            form.set_description(args.description);
            if let Some(status) = args.status {
                form.set_status(status.into());
            }
            let files = read_images(&args.images).await?;
            console.upload_images(&mut form, files).await;
            console.submit_form(&form).await?;
            if let Some(post) = console.posts().posts().last() {
                terminal.print(&views::post_detail(post))?;
            }
        }
        PostsCommand::Update(args) => {
            let mut form = console.open_editor(args.id).await?;
            if let Some(description) = args.description {
                form.set_description(description);
            }
            if let Some(status) = args.status {
                form.set_status(status.into());
            }

            let mut indices = args.remove_images;
            indices.sort_unstable();
            indices.dedup();
            for index in indices.into_iter().rev() {
                if !form.remove_image(index) {
                    return Err(DomainError::validation(format!(
                        "post {} has no image at index {index}",
                        args.id
                    ))
                    .into());
                }
            }

            let files = read_images(&args.add_images).await?;
            console.upload_images(&mut form, files).await;
            console.submit_form(&form).await?;
            let post = console.post(args.id).await?;
            terminal.print(&views::post_detail(&post))?;
        }
        PostsCommand::Delete(args) => match console.delete(args.id).await? {
            DeleteOutcome::Deleted => terminal.print(&format!("post {} deleted", args.id))?,
            DeleteOutcome::Declined => terminal.notice("deletion cancelled")?,
        },
        PostsCommand::Toggle(args) => {
            let status = console.toggle_status(args.id).await?;
            terminal.print(&format!("post {} is now {status}", args.id))?;
        }
    }
    Ok(())
}

async fn run_gallery(settings: &Settings, args: GalleryArgs) -> Result<(), AppError> {
    let terminal = Arc::new(Terminal::stdio());
    let console = connect(settings, terminal.clone())?;
    let post = console.post(args.id).await?;
    gallery::run(&terminal, post.images, args.start)?;
    Ok(())
}

async fn run_browse(settings: &Settings) -> Result<(), AppError> {
    let terminal = Arc::new(Terminal::stdio());
    let mut console = connect(settings, terminal.clone())?;
    browse::run(&mut console, &terminal).await?;
    Ok(())
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageFile>, AppError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(ImageFile::new(name, bytes));
    }
    Ok(files)
}
