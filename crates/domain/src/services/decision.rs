//! Preference decision function.
//!
//! Maps a (preference, notification type, channel) triple to allow or deny.
//! Pure: no I/O, no mutation, deterministic in its inputs.

use serde::Serialize;

use crate::models::{Channel, Frequency, NotificationType, UserPreference};

/// Why a dispatch was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoPreferenceOnFile,
    CategoryOptedOut,
    ChannelOptedOut,
    FrequencyNever,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoPreferenceOnFile => "no_preference_on_file",
            DenyReason::CategoryOptedOut => "category_opted_out",
            DenyReason::ChannelOptedOut => "channel_opted_out",
            DenyReason::FrequencyNever => "frequency_never",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether a notification may be sent.
///
/// Fails closed on a missing record. Category is checked before channel so
/// the reason is as precise as possible; `frequency = never` still denies
/// when both pass.
pub fn decide(
    preference: Option<&UserPreference>,
    notification_type: NotificationType,
    channel: Channel,
) -> Decision {
    let Some(preference) = preference else {
        return Decision::Deny(DenyReason::NoPreferenceOnFile);
    };
    let settings = &preference.preferences;

    if !settings.is_opted_in(notification_type) {
        return Decision::Deny(DenyReason::CategoryOptedOut);
    }
    if !settings.channels.allows(channel) {
        return Decision::Deny(DenyReason::ChannelOptedOut);
    }
    if settings.frequency == Frequency::Never {
        return Decision::Deny(DenyReason::FrequencyNever);
    }

    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelSettings, NotificationSettings};
    use chrono::Utc;

    const FREQUENCIES: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Never,
    ];

    fn preference(settings: NotificationSettings) -> UserPreference {
        let now = Utc::now();
        UserPreference {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            preferences: settings,
            timezone: "UTC".to_string(),
            last_updated: now,
            created_at: now,
        }
    }

    fn all_on(frequency: Frequency) -> NotificationSettings {
        NotificationSettings {
            marketing: true,
            newsletter: true,
            updates: true,
            frequency,
            channels: ChannelSettings {
                email: true,
                sms: true,
                push: true,
            },
        }
    }

    /// Every combination of category flags, channel flags and frequency.
    fn every_settings() -> Vec<NotificationSettings> {
        let mut all = Vec::new();
        for bits in 0u8..64 {
            for frequency in FREQUENCIES {
                all.push(NotificationSettings {
                    marketing: bits & 1 != 0,
                    newsletter: bits & 2 != 0,
                    updates: bits & 4 != 0,
                    frequency,
                    channels: ChannelSettings {
                        email: bits & 8 != 0,
                        sms: bits & 16 != 0,
                        push: bits & 32 != 0,
                    },
                });
            }
        }
        all
    }

    #[test]
    fn test_no_preference_fails_closed() {
        for t in NotificationType::ALL {
            for c in Channel::ALL {
                assert_eq!(
                    decide(None, t, c),
                    Decision::Deny(DenyReason::NoPreferenceOnFile)
                );
            }
        }
    }

    #[test]
    fn test_all_enabled_allows() {
        let pref = preference(all_on(Frequency::Daily));
        for t in NotificationType::ALL {
            for c in Channel::ALL {
                assert!(decide(Some(&pref), t, c).is_allowed());
            }
        }
    }

    #[test]
    fn test_category_opt_out_never_allows() {
        for settings in every_settings() {
            let pref = preference(settings);
            for t in NotificationType::ALL {
                if settings.is_opted_in(t) {
                    continue;
                }
                for c in Channel::ALL {
                    assert_eq!(
                        decide(Some(&pref), t, c),
                        Decision::Deny(DenyReason::CategoryOptedOut)
                    );
                }
            }
        }
    }

    #[test]
    fn test_frequency_never_denies_everything() {
        for settings in every_settings() {
            if settings.frequency != Frequency::Never {
                continue;
            }
            let pref = preference(settings);
            for t in NotificationType::ALL {
                for c in Channel::ALL {
                    assert!(!decide(Some(&pref), t, c).is_allowed());
                }
            }
        }
    }

    #[test]
    fn test_frequency_never_with_everything_enabled() {
        let pref = preference(all_on(Frequency::Never));
        for t in NotificationType::ALL {
            for c in Channel::ALL {
                assert_eq!(
                    decide(Some(&pref), t, c),
                    Decision::Deny(DenyReason::FrequencyNever)
                );
            }
        }
    }

    #[test]
    fn test_channel_reason_takes_precedence_over_frequency() {
        let mut settings = all_on(Frequency::Never);
        settings.channels.sms = false;
        let pref = preference(settings);
        assert_eq!(
            decide(Some(&pref), NotificationType::Updates, Channel::Sms),
            Decision::Deny(DenyReason::ChannelOptedOut)
        );
    }

    #[test]
    fn test_category_opted_out_scenario() {
        let mut settings = all_on(Frequency::Daily);
        settings.marketing = false;
        let pref = preference(settings);
        assert_eq!(
            decide(Some(&pref), NotificationType::Marketing, Channel::Email),
            Decision::Deny(DenyReason::CategoryOptedOut)
        );
        assert!(decide(Some(&pref), NotificationType::Updates, Channel::Email).is_allowed());
    }

    #[test]
    fn test_channel_opted_out_scenario() {
        let mut settings = all_on(Frequency::Weekly);
        settings.channels.sms = false;
        let pref = preference(settings);
        assert_eq!(
            decide(Some(&pref), NotificationType::Marketing, Channel::Sms),
            Decision::Deny(DenyReason::ChannelOptedOut)
        );
    }

    #[test]
    fn test_allow_matches_flags_exactly() {
        for settings in every_settings() {
            let pref = preference(settings);
            for t in NotificationType::ALL {
                for c in Channel::ALL {
                    let expected = settings.is_opted_in(t)
                        && settings.channels.allows(c)
                        && settings.frequency != Frequency::Never;
                    assert_eq!(decide(Some(&pref), t, c).is_allowed(), expected);
                }
            }
        }
    }

    #[test]
    fn test_deny_reason_strings() {
        assert_eq!(DenyReason::NoPreferenceOnFile.to_string(), "no_preference_on_file");
        assert_eq!(DenyReason::CategoryOptedOut.to_string(), "category_opted_out");
        assert_eq!(DenyReason::ChannelOptedOut.to_string(), "channel_opted_out");
        assert_eq!(DenyReason::FrequencyNever.to_string(), "frequency_never");
        assert_eq!(
            serde_json::to_value(DenyReason::FrequencyNever).unwrap(),
            "frequency_never"
        );
    }
}
