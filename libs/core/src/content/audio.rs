use serde::{Deserialize, Serialize};

use super::scrub;

/// Catalogue of host notification sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    Default,
    Im,
    Mail,
    Reminder,
    Sms,
    Alarm,
    Alarm2,
    Alarm3,
    Alarm4,
    Alarm5,
    Alarm6,
    Alarm7,
    Alarm8,
    Alarm9,
    Alarm10,
    Call,
    Call2,
    Call3,
    Call4,
    Call5,
    Call6,
    Call7,
    Call8,
    Call9,
    Call10,
}

impl Sound {
    pub fn uri(&self) -> &'static str {
        match self {
            Sound::Default => "ms-winsoundevent:Notification.Default",
            Sound::Im => "ms-winsoundevent:Notification.IM",
            Sound::Mail => "ms-winsoundevent:Notification.Mail",
            Sound::Reminder => "ms-winsoundevent:Notification.Reminder",
            Sound::Sms => "ms-winsoundevent:Notification.SMS",
            Sound::Alarm => "ms-winsoundevent:Notification.Looping.Alarm",
            Sound::Alarm2 => "ms-winsoundevent:Notification.Looping.Alarm2",
            Sound::Alarm3 => "ms-winsoundevent:Notification.Looping.Alarm3",
            Sound::Alarm4 => "ms-winsoundevent:Notification.Looping.Alarm4",
            Sound::Alarm5 => "ms-winsoundevent:Notification.Looping.Alarm5",
            Sound::Alarm6 => "ms-winsoundevent:Notification.Looping.Alarm6",
            Sound::Alarm7 => "ms-winsoundevent:Notification.Looping.Alarm7",
            Sound::Alarm8 => "ms-winsoundevent:Notification.Looping.Alarm8",
            Sound::Alarm9 => "ms-winsoundevent:Notification.Looping.Alarm9",
            Sound::Alarm10 => "ms-winsoundevent:Notification.Looping.Alarm10",
            Sound::Call => "ms-winsoundevent:Notification.Looping.Call",
            Sound::Call2 => "ms-winsoundevent:Notification.Looping.Call2",
            Sound::Call3 => "ms-winsoundevent:Notification.Looping.Call3",
            Sound::Call4 => "ms-winsoundevent:Notification.Looping.Call4",
            Sound::Call5 => "ms-winsoundevent:Notification.Looping.Call5",
            Sound::Call6 => "ms-winsoundevent:Notification.Looping.Call6",
            Sound::Call7 => "ms-winsoundevent:Notification.Looping.Call7",
            Sound::Call8 => "ms-winsoundevent:Notification.Looping.Call8",
            Sound::Call9 => "ms-winsoundevent:Notification.Looping.Call9",
            Sound::Call10 => "ms-winsoundevent:Notification.Looping.Call10",
        }
    }

    /// Alarm and call sounds belong to the looping class; the builder
    /// extends the display duration for them so the sound is not cut off.
    pub fn is_looping_class(&self) -> bool {
        !matches!(
            self,
            Sound::Default | Sound::Im | Sound::Mail | Sound::Reminder | Sound::Sms
        )
    }
}

/// Where a sound comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SoundSource {
    System(Sound),
    Uri(String),
}

impl SoundSource {
    pub fn uri(&self) -> &str {
        match self {
            SoundSource::System(sound) => sound.uri(),
            SoundSource::Uri(uri) => uri,
        }
    }

    pub fn is_looping_class(&self) -> bool {
        match self {
            SoundSource::System(sound) => sound.is_looping_class(),
            SoundSource::Uri(uri) => uri.contains("Looping"),
        }
    }
}

/// Audio accompaniment for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Audio {
    Standard { source: SoundSource, looping: bool },
    /// Suppresses sound entirely. Mutually exclusive with a source.
    Silent,
}

impl Audio {
    pub fn sound(sound: Sound) -> Self {
        Audio::Standard {
            source: SoundSource::System(sound),
            looping: false,
        }
    }

    pub fn sound_looped(sound: Sound) -> Self {
        Audio::Standard {
            source: SoundSource::System(sound),
            looping: true,
        }
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Audio::Standard {
            source: SoundSource::Uri(scrub(uri)),
            looping: false,
        }
    }

    pub fn silent() -> Self {
        Audio::Silent
    }

    pub(crate) fn wants_long_duration(&self) -> bool {
        match self {
            Audio::Standard { source, .. } => source.is_looping_class(),
            Audio::Silent => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_class_covers_alarms_and_calls() {
        assert!(Sound::Alarm.is_looping_class());
        assert!(Sound::Call7.is_looping_class());
        assert!(!Sound::Mail.is_looping_class());
        assert!(!Sound::Default.is_looping_class());
    }

    #[test]
    fn raw_uri_class_follows_looping_marker() {
        let looping = SoundSource::Uri("ms-winsoundevent:Notification.Looping.Alarm3".into());
        let oneshot = SoundSource::Uri("file:///tmp/ding.wav".into());
        assert!(looping.is_looping_class());
        assert!(!oneshot.is_looping_class());
    }

    #[test]
    fn silent_never_wants_long_duration() {
        assert!(!Audio::silent().wants_long_duration());
        assert!(Audio::sound(Sound::Call).wants_long_duration());
        assert!(!Audio::sound(Sound::Im).wants_long_duration());
    }
}
