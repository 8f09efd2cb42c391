// Mapping from a FeatureVector to the messages the sound engine listens for
//
// Send-side shaping applied here, never in the analysis core:
// - segmentation is clamped to [0, 1]
// - magenta is merged into red, cyan into blue
// - colour fractions below the presence floor become 0.0, above the
//   saturation ceiling 1.0

use crate::analysis::FeatureVector;
use crate::config::OscConfig;
use crate::error::TransportError;
use crate::osc::message::OscMessage;

/// Apply the presence floor and saturation ceiling to one colour fraction
pub fn gate_fraction(value: f64, floor: f64, ceiling: f64) -> f64 {
    if value < floor {
        0.0
    } else if value > ceiling {
        1.0
    } else {
        value
    }
}

fn address(config: &OscConfig, name: &str) -> String {
    format!("{}/{}", config.address_prefix.trim_end_matches('/'), name)
}

/// Feature and control messages for one frame, in send order
///
/// The `/morph` trigger is not included; see [`morph_trigger`].
///
/// # Errors
/// * `InvalidSetting` if the colour gates or port are out of range
/// * `InvalidAddress` if the configured prefix produces invalid addresses
pub fn feature_messages(
    features: &FeatureVector,
    config: &OscConfig,
) -> Result<Vec<OscMessage>, TransportError> {
    config.validate()?;
    let float = |name: &str, value: f64| OscMessage::float(address(config, name), value as f32);

    let mut messages = vec![
        float("brightness", features.brightness)?,
        float("segmentation", features.segmentation.clamp(0.0, 1.0))?,
        float("frequency", features.frequency)?,
        float("noise", features.noise)?,
        float("harmony", features.harmony)?,
        float("hue_spread", features.centroid)?,
    ];

    if let Some(bpm) = config.bpm {
        messages.push(OscMessage::int(address(config, "bpm"), bpm)?);
    }
    if let Some(morph_time) = config.morph_time {
        messages.push(OscMessage::float(address(config, "morphtime"), morph_time)?);
    }

    let c = &features.composition;
    let colours = [
        ("red", c.red + c.magenta),
        ("green", c.green),
        ("blue", c.blue + c.cyan),
        ("yellow", c.yellow),
        ("white", c.white),
        ("black", c.black),
    ];
    for (name, fraction) in colours {
        let gated = gate_fraction(fraction, config.presence_floor, config.saturation_ceiling);
        messages.push(float(name, gated)?);
    }

    Ok(messages)
}

/// `/morph 1` when morph triggering is enabled
pub fn morph_trigger(config: &OscConfig) -> Result<Option<OscMessage>, TransportError> {
    if !config.trigger_morph {
        return Ok(None);
    }
    OscMessage::int(address(config, "morph"), 1).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ColorComposition;
    use crate::osc::message::OscArg;

    fn features() -> FeatureVector {
        FeatureVector {
            brightness: 100.0,
            composition: ColorComposition {
                red: 0.02,
                magenta: 0.2,
                green: 0.04,
                blue: 0.1,
                cyan: 0.25,
                yellow: 0.2,
                white: 0.0,
                black: 0.5,
            },
            segmentation: 2.5,
            harmony: 0.7,
            centroid: 0.3,
            mean_hsv: [0.0; 3],
            frequency: 12.0,
            noise: 0.4,
            noise_variance: 211.0,
            hue_histogram: vec![],
        }
    }

    fn value_of(messages: &[OscMessage], address: &str) -> Option<OscArg> {
        messages
            .iter()
            .find(|m| m.address() == address)
            .map(|m| m.args()[0].clone())
    }

    #[test]
    fn test_gate_fraction() {
        assert_eq!(gate_fraction(0.049, 0.05, 0.3), 0.0);
        assert_eq!(gate_fraction(0.05, 0.05, 0.3), 0.05);
        assert_eq!(gate_fraction(0.3, 0.05, 0.3), 0.3);
        assert_eq!(gate_fraction(0.31, 0.05, 0.3), 1.0);
    }

    #[test]
    fn test_shaping_and_merges() {
        let messages = feature_messages(&features(), &OscConfig::default()).unwrap();

        assert_eq!(value_of(&messages, "/segmentation"), Some(OscArg::Float(1.0)));
        // 0.02 red + 0.2 magenta stays inside the gates
        assert_eq!(value_of(&messages, "/red"), Some(OscArg::Float(0.22)));
        // 0.1 blue + 0.25 cyan crosses the ceiling
        assert_eq!(value_of(&messages, "/blue"), Some(OscArg::Float(1.0)));
        assert_eq!(value_of(&messages, "/green"), Some(OscArg::Float(0.0)));
        assert_eq!(value_of(&messages, "/black"), Some(OscArg::Float(1.0)));
        assert_eq!(value_of(&messages, "/hue_spread"), Some(OscArg::Float(0.3)));
        assert_eq!(value_of(&messages, "/bpm"), Some(OscArg::Int(120)));
        assert_eq!(value_of(&messages, "/morphtime"), Some(OscArg::Float(5.0)));
        assert!(value_of(&messages, "/cyan").is_none());
    }

    #[test]
    fn test_optional_controls_and_prefix() {
        let config = OscConfig {
            address_prefix: "/cam/".to_string(),
            bpm: None,
            morph_time: None,
            trigger_morph: false,
            ..OscConfig::default()
        };
        let messages = feature_messages(&features(), &config).unwrap();
        assert_eq!(messages.len(), 12);
        assert!(messages.iter().all(|m| m.address().starts_with("/cam/")));
        assert_eq!(morph_trigger(&config).unwrap(), None);

        let trigger = morph_trigger(&OscConfig::default()).unwrap().unwrap();
        assert_eq!(trigger.address(), "/morph");
        assert_eq!(trigger.args(), &[OscArg::Int(1)]);
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        let config = OscConfig {
            address_prefix: "no slash".to_string(),
            ..OscConfig::default()
        };
        assert!(matches!(
            feature_messages(&features(), &config),
            Err(TransportError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_gates() {
        let config = OscConfig {
            presence_floor: 0.4,
            saturation_ceiling: 0.2,
            ..OscConfig::default()
        };
        assert!(matches!(
            feature_messages(&features(), &config),
            Err(TransportError::InvalidSetting {
                name: "presence_floor",
                ..
            })
        ));
    }
}
