//! Command line front end for the toastway pipeline.
//!
//! `toastway render` prints the markup a toast would carry without
//! touching the spool. `send`, `update`, `remove`, and `history` drive
//! the file-backed spool host, so shell scripts can post and manage
//! notifications with the same semantics the library exposes.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;
use tw_core::content::{ActionSet, Audio, Button, Image, ProgressBar, Scenario, Sound, Text};
use tw_core::delivery::{RemoveSelector, SpoolHost, SubmitOptions, UpdateOutcome};
use tw_core::{
    BindingMode, ContentDefaults, DeliveryIdentity, MediaCache, MediaConfig, MediaResolver,
    Notifier, PassthroughResolver, SequenceNumber, SpoolConfig, ToastBuilder, ToastContent,
    render_payload,
};

#[derive(Parser, Debug)]
#[command(
    name = "toastway",
    version,
    about = "Compose, spool, and inspect toast notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Render toast markup to stdout without spooling anything.
    Render {
        #[command(flatten)]
        content: ContentArgs,
        /// Keep `{key}` placeholders for host-side binding instead of
        /// stripping the wrappers.
        #[arg(long)]
        template: bool,
        /// Mark the toast urgent.
        #[arg(long)]
        urgent: bool,
        /// Print the payload on one line instead of indented.
        #[arg(long)]
        compact: bool,
    },
    /// Compose a toast and post it to the spool.
    Send {
        #[command(flatten)]
        content: ContentArgs,
        #[command(flatten)]
        delivery: DeliveryArgs,
    },
    /// Re-bind data on a spooled toast without replacing it.
    Update {
        /// Notification id assigned at send time.
        #[arg(long, value_name = "ID")]
        id: String,
        /// Binding value as KEY=VALUE. Repeatable.
        #[arg(long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,
        /// Sequence number; anything at or below the spooled one is
        /// rejected as stale. Omit to refresh unconditionally.
        #[arg(long, value_name = "N")]
        sequence: Option<u64>,
    },
    /// Remove spooled notifications.
    Remove {
        /// Remove one notification by id.
        #[arg(long, value_name = "ID")]
        id: Option<String>,
        /// Remove every notification carrying this tag.
        #[arg(long, value_name = "TAG")]
        tag: Option<String>,
        /// Remove every notification in this group.
        #[arg(long, value_name = "GROUP")]
        group: Option<String>,
        /// Clear the whole spool.
        #[arg(long)]
        all: bool,
    },
    /// List spooled notifications, newest first.
    History {
        /// Only the record with this id.
        #[arg(long, value_name = "ID")]
        id: Option<String>,
        /// Emit records as JSON instead of one line per record.
        #[arg(long)]
        json: bool,
    },
}

/// Content options shared by `render` and `send`.
#[derive(Args, Debug, Clone)]
struct ContentArgs {
    /// Title line at the top of the toast.
    #[arg(long, value_name = "TEXT")]
    title: Option<String>,
    /// Body line. Repeatable.
    #[arg(long = "line", value_name = "TEXT")]
    lines: Vec<String>,
    /// Attribution text pinned under the body.
    #[arg(long, value_name = "TEXT")]
    attribution: Option<String>,
    /// Square logo overriding the app icon.
    #[arg(long, value_name = "URI")]
    logo: Option<String>,
    /// Full-width hero image above the body.
    #[arg(long, value_name = "URI")]
    hero: Option<String>,
    /// Inline body image. Repeatable.
    #[arg(long = "image", value_name = "URI")]
    images: Vec<String>,
    /// Progress bar as STATUS=FRACTION (0 to 1) or STATUS=indeterminate.
    #[arg(long, value_name = "STATUS=VALUE")]
    progress: Option<String>,
    /// Button as LABEL=ARGUMENTS. Repeatable, up to five.
    #[arg(long = "button", value_name = "LABEL=ARGS")]
    buttons: Vec<String>,
    /// Arguments handed to the application when the body is clicked.
    #[arg(long, value_name = "ARGS")]
    launch: Option<String>,
    /// Toast scenario.
    #[arg(long, value_enum, value_name = "SCENARIO")]
    scenario: Option<ScenarioArg>,
    /// Named notification sound, e.g. `default`, `reminder`, `alarm2`.
    #[arg(long, value_name = "NAME")]
    audio: Option<String>,
    /// Loop the sound until the toast is dismissed.
    #[arg(long)]
    audio_loop: bool,
    /// Show the toast without any sound.
    #[arg(long)]
    silent: bool,
}

/// Spool options accepted by `send`.
#[derive(Args, Debug, Clone)]
struct DeliveryArgs {
    /// Stable notification id. Sending again with the same id replaces
    /// the earlier toast.
    #[arg(long, value_name = "ID")]
    id: Option<String>,
    /// Binding value as KEY=VALUE. Any `--data` switches rendering to
    /// template mode. Repeatable.
    #[arg(long = "data", value_name = "KEY=VALUE")]
    data: Vec<String>,
    /// Sequence number guarding later updates.
    #[arg(long, value_name = "N")]
    sequence: Option<u64>,
    /// Mark the toast urgent.
    #[arg(long)]
    urgent: bool,
    /// Deliver quietly to the action center without a popup.
    #[arg(long)]
    suppress_popup: bool,
    /// Drop the record from history after this many seconds.
    #[arg(long, value_name = "SECS")]
    expires_in: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScenarioArg {
    Reminder,
    Alarm,
    IncomingCall,
}

impl From<ScenarioArg> for Scenario {
    fn from(value: ScenarioArg) -> Self {
        match value {
            ScenarioArg::Reminder => Scenario::Reminder,
            ScenarioArg::Alarm => Scenario::Alarm,
            ScenarioArg::IncomingCall => Scenario::IncomingCall,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Render {
            content,
            template,
            urgent,
            compact,
        } => handle_render(content, template, urgent, compact).await,
        CliCommand::Send { content, delivery } => handle_send(content, delivery).await,
        CliCommand::Update { id, data, sequence } => handle_update(id, data, sequence).await,
        CliCommand::Remove {
            id,
            tag,
            group,
            all,
        } => handle_remove(id, tag, group, all).await,
        CliCommand::History { id, json } => handle_history(id, json).await,
    }
}

async fn handle_render(
    content: ContentArgs,
    template: bool,
    urgent: bool,
    compact: bool,
) -> Result<()> {
    // Render never spools, so image sources pass through unresolved.
    let toast = build_content(&content, &PassthroughResolver, false).await?;
    let mode = if template {
        BindingMode::Template
    } else {
        BindingMode::Literal
    };
    let payload = render_payload(&toast, mode, urgent)?;
    if compact {
        println!("{}", payload.markup);
    } else {
        println!("{}", payload.root.to_markup_pretty());
    }
    if !payload.binding_keys.is_empty() {
        eprintln!("binding keys: {}", payload.binding_keys.join(", "));
    }
    Ok(())
}

async fn handle_send(content: ContentArgs, delivery: DeliveryArgs) -> Result<()> {
    let media_cfg = MediaConfig::from_env();
    let media = MediaCache::new(&media_cfg);
    let toast = build_content(&content, &media, media_cfg.force_refresh).await?;
    let notifier = spool_notifier();

    let mut opts = SubmitOptions::new()
        .urgent(delivery.urgent)
        .suppress_popup(delivery.suppress_popup);
    if let Some(id) = delivery.id {
        opts = opts.id(id);
    }
    if !delivery.data.is_empty() {
        opts = opts.data(parse_data_pairs(&delivery.data)?);
    }
    if let Some(sequence) = delivery.sequence {
        opts = opts.sequence(sequence);
    }
    if let Some(secs) = delivery.expires_in {
        opts = opts.expires_at(OffsetDateTime::now_utc() + Duration::seconds(secs as i64));
    }

    let receipt = notifier.submit(&toast, opts).await?;
    println!("posted {}", receipt.identity);
    if !receipt.binding_keys.is_empty() {
        println!("binding keys: {}", receipt.binding_keys.join(", "));
    }
    for warning in &receipt.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

async fn handle_update(id: String, data: Vec<String>, sequence: Option<u64>) -> Result<()> {
    let identity = DeliveryIdentity::for_id(id);
    let outcome = spool_notifier()
        .update(
            &identity,
            parse_data_pairs(&data)?,
            sequence.map(SequenceNumber::new),
        )
        .await?;
    match outcome {
        UpdateOutcome::Applied => println!("updated {identity}"),
        UpdateOutcome::Stale => return Err(anyhow!("sequence is stale for {identity}")),
        UpdateOutcome::NotFound => return Err(anyhow!("no spooled notification {identity}")),
    }
    Ok(())
}

async fn handle_remove(
    id: Option<String>,
    tag: Option<String>,
    group: Option<String>,
    all: bool,
) -> Result<()> {
    let selector = match (id, tag, group, all) {
        (Some(id), None, None, false) => RemoveSelector::Exact(DeliveryIdentity::for_id(id)),
        (None, Some(tag), None, false) => RemoveSelector::Tag(tag),
        (None, None, Some(group), false) => RemoveSelector::Group(group),
        (None, None, None, true) => RemoveSelector::All,
        _ => return Err(anyhow!("pass exactly one of --id, --tag, --group, --all")),
    };
    let removed = spool_notifier().remove(&selector).await?;
    println!("removed {removed}");
    Ok(())
}

async fn handle_history(id: Option<String>, json: bool) -> Result<()> {
    let identity = id.map(DeliveryIdentity::for_id);
    let records = spool_notifier().history(identity.as_ref()).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("spool is empty");
        return Ok(());
    }
    for record in records {
        let mut line = format!("{}  seq={}", record.identity, record.sequence);
        if let Ok(stamp) = record.updated_at.format(&Rfc3339) {
            line.push_str("  updated=");
            line.push_str(&stamp);
        }
        if record.suppress_popup {
            line.push_str("  quiet");
        }
        println!("{line}");
    }
    Ok(())
}

fn spool_notifier() -> Notifier {
    let host = Arc::new(SpoolHost::new(&SpoolConfig::from_env()));
    Notifier::new(host)
}

async fn build_content(
    args: &ContentArgs,
    media: &dyn MediaResolver,
    force_refresh: bool,
) -> Result<ToastContent> {
    let mut builder =
        ToastBuilder::with_defaults(ContentDefaults::from_env()).force_media_refresh(force_refresh);
    if let Some(title) = &args.title {
        builder = builder.text(Text::new(title.as_str()));
    }
    for line in &args.lines {
        builder = builder.text(Text::new(line.as_str()));
    }
    if let Some(attribution) = &args.attribution {
        builder = builder.attribution(Text::new(attribution.as_str()));
    }
    if let Some(logo) = &args.logo {
        builder = builder.image(Image::logo(logo.as_str()));
    }
    if let Some(hero) = &args.hero {
        builder = builder.image(Image::hero(hero.as_str()));
    }
    for source in &args.images {
        builder = builder.image(Image::inline(source.as_str()));
    }
    if let Some(spec) = &args.progress {
        builder = builder.progress(parse_progress(spec)?);
    }
    if !args.buttons.is_empty() {
        let mut buttons = Vec::with_capacity(args.buttons.len());
        for spec in &args.buttons {
            let (label, arguments) = spec
                .split_once('=')
                .ok_or_else(|| anyhow!("expected LABEL=ARGS, got {spec:?}"))?;
            buttons.push(Button::new(label, arguments).into());
        }
        builder = builder.actions(ActionSet::buttons(buttons)?);
    }
    if let Some(arguments) = &args.launch {
        builder = builder.launch(arguments.as_str());
    }
    if let Some(scenario) = args.scenario {
        builder = builder.scenario(scenario.into());
    }
    if args.silent {
        builder = builder.audio(Audio::silent());
    } else if let Some(name) = &args.audio {
        let sound = parse_sound(name)?;
        builder = builder.audio(if args.audio_loop {
            Audio::sound_looped(sound)
        } else {
            Audio::sound(sound)
        });
    }
    Ok(builder.build(media).await)
}

fn parse_data_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut data = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got {pair:?}"))?;
        data.insert(key.to_string(), value.to_string());
    }
    Ok(data)
}

fn parse_progress(spec: &str) -> Result<ProgressBar> {
    let (status, value) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("expected STATUS=VALUE, got {spec:?}"))?;
    let bar = if value.eq_ignore_ascii_case("indeterminate") {
        ProgressBar::indeterminate(status)?
    } else {
        let fraction: f64 = value
            .parse()
            .with_context(|| format!("progress value {value:?} is not a number"))?;
        ProgressBar::determinate(status, fraction)?
    };
    Ok(bar)
}

fn parse_sound(name: &str) -> Result<Sound> {
    let sound = match name.to_ascii_lowercase().as_str() {
        "default" => Sound::Default,
        "im" => Sound::Im,
        "mail" => Sound::Mail,
        "reminder" => Sound::Reminder,
        "sms" => Sound::Sms,
        "alarm" | "alarm1" => Sound::Alarm,
        "alarm2" => Sound::Alarm2,
        "alarm3" => Sound::Alarm3,
        "alarm4" => Sound::Alarm4,
        "alarm5" => Sound::Alarm5,
        "alarm6" => Sound::Alarm6,
        "alarm7" => Sound::Alarm7,
        "alarm8" => Sound::Alarm8,
        "alarm9" => Sound::Alarm9,
        "alarm10" => Sound::Alarm10,
        "call" | "call1" => Sound::Call,
        "call2" => Sound::Call2,
        "call3" => Sound::Call3,
        "call4" => Sound::Call4,
        "call5" => Sound::Call5,
        "call6" => Sound::Call6,
        "call7" => Sound::Call7,
        "call8" => Sound::Call8,
        "call9" => Sound::Call9,
        "call10" => Sound::Call10,
        other => return Err(anyhow!("unknown sound {other:?}")),
    };
    Ok(sound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_pairs_split_on_first_equals() {
        let data = parse_data_pairs(&["progress=0.5".into(), "note=a=b".into()]).unwrap();
        assert_eq!(data.get("progress").map(String::as_str), Some("0.5"));
        assert_eq!(data.get("note").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn data_pairs_reject_missing_key() {
        assert!(parse_data_pairs(&["=value".into()]).is_err());
        assert!(parse_data_pairs(&["no-separator".into()]).is_err());
    }

    #[test]
    fn progress_specs_cover_both_shapes() {
        assert!(parse_progress("Downloading=0.3").is_ok());
        assert!(parse_progress("Working=indeterminate").is_ok());
        assert!(parse_progress("Missing").is_err());
        assert!(parse_progress("Bad=fast").is_err());
    }

    #[test]
    fn sound_names_map_to_the_catalog() {
        assert!(matches!(parse_sound("Default"), Ok(Sound::Default)));
        assert!(matches!(parse_sound("alarm2"), Ok(Sound::Alarm2)));
        assert!(matches!(parse_sound("call10"), Ok(Sound::Call10)));
        assert!(parse_sound("klaxon").is_err());
    }
}
