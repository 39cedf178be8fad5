use tracing::warn;

use time::OffsetDateTime;

use super::{
    ActionSet, ActivationKind, Audio, BodyElement, Group, Header, Image, ImageRole, People,
    ProgressBar, Scenario, SubgroupChild, Text, ToastContent, ToastDuration, Visual,
};
use crate::config::ContentDefaults;
use crate::media::MediaResolver;

/// Assembles a [`ToastContent`] from individually constructed elements.
///
/// The builder is declarative: elements are added in any order, and
/// [`build`](ToastBuilder::build) applies the defaults, resolves image
/// sources through the given [`MediaResolver`], and couples looping audio
/// to a long display duration. Media failures are logged and the image
/// omitted; they never fail the build.
///
/// ```
/// use tw_core::content::{Image, Text, ToastBuilder};
///
/// let builder = ToastBuilder::new()
///     .text(Text::new("Backup finished"))
///     .image(Image::logo("logo.png"));
/// // builder.build(&resolver).await yields the finished ToastContent
/// ```
#[derive(Default)]
pub struct ToastBuilder {
    body: Vec<BodyElement>,
    logo: Option<Image>,
    hero: Option<Image>,
    attribution: Option<Text>,
    base_uri: Option<String>,
    lang: Option<String>,
    actions: Option<ActionSet>,
    audio: Option<Audio>,
    header: Option<Header>,
    scenario: Option<Scenario>,
    duration: Option<ToastDuration>,
    launch: Option<String>,
    activation: Option<ActivationKind>,
    people: Option<People>,
    timestamp: Option<OffsetDateTime>,
    defaults: ContentDefaults,
    force_media_refresh: bool,
}

impl ToastBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: ContentDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn text(mut self, text: Text) -> Self {
        self.body.push(BodyElement::Text(text));
        self
    }

    /// Routes the image by its role: inline images join the body in
    /// order, logo and hero occupy their single slot (last one wins).
    pub fn image(mut self, image: Image) -> Self {
        match image.role {
            ImageRole::Inline => self.body.push(BodyElement::Image(image)),
            ImageRole::Logo => self.logo = Some(image),
            ImageRole::Hero => self.hero = Some(image),
        }
        self
    }

    pub fn progress(mut self, bar: ProgressBar) -> Self {
        self.body.push(BodyElement::Progress(bar));
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.body.push(BodyElement::Group(group));
        self
    }

    pub fn attribution(mut self, text: Text) -> Self {
        self.attribution = Some(text);
        self
    }

    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn actions(mut self, actions: ActionSet) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn audio(mut self, audio: Audio) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn duration(mut self, duration: ToastDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Arguments handed to the application when the notification body
    /// itself is clicked.
    pub fn launch(mut self, arguments: impl Into<String>) -> Self {
        self.launch = Some(super::scrub(arguments));
        self
    }

    pub fn activation(mut self, kind: ActivationKind) -> Self {
        self.activation = Some(kind);
        self
    }

    pub fn people(mut self, people: People) -> Self {
        self.people = Some(people);
        self
    }

    /// Overrides the host-assigned display time shown on the notification.
    pub fn timestamp(mut self, when: OffsetDateTime) -> Self {
        self.timestamp = Some(when);
        self
    }

    /// Bypasses the media cache and re-fetches every remote image.
    pub fn force_media_refresh(mut self, force: bool) -> Self {
        self.force_media_refresh = force;
        self
    }

    /// Finalizes the content.
    ///
    /// A body with no text gets the configured default title line, and an
    /// empty logo slot gets the configured default logo. Every image
    /// source is then resolved through `media`; sources that fail to
    /// resolve are logged and omitted. Looping-class audio extends an
    /// unset duration to [`ToastDuration::Long`].
    pub async fn build(mut self, media: &dyn MediaResolver) -> ToastContent {
        if !self.body.iter().any(|el| matches!(el, BodyElement::Text(_))) {
            self.body
                .insert(0, BodyElement::Text(Text::new(self.defaults.title.clone())));
        }
        if self.logo.is_none() {
            if let Some(path) = &self.defaults.logo {
                self.logo = Some(Image::logo(path.display().to_string()));
            }
        }

        let force = self.force_media_refresh;
        let mut body = Vec::with_capacity(self.body.len());
        for element in self.body {
            match element {
                BodyElement::Image(image) => {
                    if let Some(image) = resolve_image(media, image, force).await {
                        body.push(BodyElement::Image(image));
                    }
                }
                BodyElement::Group(mut group) => {
                    for column in &mut group.columns {
                        let children = std::mem::take(&mut column.children);
                        for child in children {
                            match child {
                                SubgroupChild::Image(image) => {
                                    if let Some(image) =
                                        resolve_image(media, image, force).await
                                    {
                                        column.children.push(SubgroupChild::Image(image));
                                    }
                                }
                                text => column.children.push(text),
                            }
                        }
                    }
                    body.push(BodyElement::Group(group));
                }
                other => body.push(other),
            }
        }
        let logo = match self.logo {
            Some(image) => resolve_image(media, image, force).await,
            None => None,
        };
        let hero = match self.hero {
            Some(image) => resolve_image(media, image, force).await,
            None => None,
        };

        let mut duration = self.duration;
        if duration.is_none()
            && self
                .audio
                .as_ref()
                .is_some_and(|audio| audio.wants_long_duration())
        {
            duration = Some(ToastDuration::Long);
        }

        ToastContent {
            visual: Visual {
                body,
                logo,
                hero,
                attribution: self.attribution,
                base_uri: self.base_uri,
                lang: self.lang,
            },
            actions: self.actions,
            audio: self.audio,
            header: self.header,
            scenario: self.scenario,
            duration,
            launch: self.launch,
            activation: self.activation,
            people: self.people,
            timestamp: self.timestamp,
        }
    }
}

async fn resolve_image(
    media: &dyn MediaResolver,
    image: Image,
    force_refresh: bool,
) -> Option<Image> {
    match media.resolve(&image.source, force_refresh).await {
        Ok(path) => Some(Image {
            source: path.display().to_string(),
            ..image
        }),
        Err(error) => {
            warn!(source = %image.source, %error, "omitting image, media resolution failed");
            None
        }
    }
}
