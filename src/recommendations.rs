//! Rule-based recommendations and the overall summary message
//!
//! Every predicted label maps to a fixed bundle of exercises, lifestyle
//! changes and tips. The summary sorts present modalities into strengths and
//! issues and renders a single sentence.

use crate::types::{
    BreathingStatus, ClassLabel, EmotionalState, GlucoseRange, HeartbeatStatus, Modality,
    PostureType, PredictionResult, PredictionSet, RecommendationBundle, RecommendationSet,
    SpeechPattern,
};

/// Static text for one label
struct Content {
    exercises: &'static [&'static str],
    lifestyle: &'static [&'static str],
    tips: &'static [&'static str],
}

impl Content {
    fn into_bundle(self, modality: Modality, status: String) -> RecommendationBundle {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        RecommendationBundle {
            title: title(modality).to_string(),
            status,
            exercises: owned(self.exercises),
            lifestyle: owned(self.lifestyle),
            tips: owned(self.tips),
        }
    }
}

/// Bundle heading for a modality
pub fn title(modality: Modality) -> &'static str {
    match modality {
        Modality::Heartbeat => "Heart Health",
        Modality::Glucose => "Blood Glucose",
        Modality::Breathing => "Breathing Health",
        Modality::Speech => "Speech & Communication",
        Modality::Emotion => "Emotional Wellbeing",
        Modality::Posture => "Posture Health",
    }
}

/// Posture status line, e.g. `Slouched Sitting (Score: 42/100)`
pub fn posture_status(label: &str, score: f64) -> String {
    format!("{} (Score: {:.0}/100)", label, score)
}

fn heartbeat_content(status: HeartbeatStatus) -> Content {
    match status {
        HeartbeatStatus::Normal => Content {
            exercises: &[
                "Continue moderate aerobic exercise (20-30 min, 3-4 times/week)",
                "Walking, swimming, or cycling at comfortable pace",
            ],
            lifestyle: &[
                "Maintain current healthy habits",
                "Stay hydrated throughout the day",
            ],
            tips: &[
                "Your heart rhythm is healthy!",
                "Keep up the good work with regular activity",
            ],
        },
        HeartbeatStatus::Bradycardia => Content {
            exercises: &[
                "Light aerobic activities to gradually increase heart rate",
                "Gentle walking for 15-20 minutes daily",
                "Stretching and flexibility exercises",
            ],
            lifestyle: &[
                "Avoid sudden intense activities",
                "Stay warm and comfortable",
                "Monitor how you feel during activities",
            ],
            tips: &[
                "Slow heart rate detected - speak with your healthcare provider",
                "Gradual increase in activity is key",
            ],
        },
        HeartbeatStatus::Tachycardia => Content {
            exercises: &[
                "Gentle breathing exercises",
                "Slow-paced yoga or tai chi",
                "Avoid high-intensity workouts temporarily",
            ],
            lifestyle: &[
                "Reduce caffeine intake",
                "Practice stress management",
                "Ensure adequate rest and sleep",
            ],
            tips: &[
                "Elevated heart rate detected",
                "Focus on relaxation and calm activities",
            ],
        },
        HeartbeatStatus::Irregular => Content {
            exercises: &[
                "Low-impact activities under supervision",
                "Seated exercises and gentle movements",
                "Avoid strenuous activities",
            ],
            lifestyle: &[
                "Monitor heart rate regularly",
                "Consult healthcare provider",
                "Keep a symptom diary",
            ],
            tips: &[
                "Irregular rhythm detected - medical consultation recommended",
                "Gentle activity is safest for now",
            ],
        },
    }
}

fn glucose_content(range: GlucoseRange) -> Content {
    match range {
        GlucoseRange::Normal => Content {
            exercises: &[
                "Regular physical activity (30 min, 5 days/week)",
                "Mix of cardio and strength training",
            ],
            lifestyle: &["Maintain balanced meals", "Continue healthy eating habits"],
            tips: &[
                "Glucose levels are well-controlled!",
                "Keep monitoring and staying active",
            ],
        },
        GlucoseRange::Low => Content {
            exercises: &[
                "Light activity after meals",
                "Avoid exercising on empty stomach",
            ],
            lifestyle: &[
                "Eat small, frequent meals",
                "Keep healthy snacks available",
                "Monitor blood sugar before activities",
            ],
            tips: &[
                "Low glucose detected - ensure regular meals",
                "Carry quick-acting carbohydrates",
            ],
        },
        GlucoseRange::High => Content {
            exercises: &[
                "Post-meal walking (15-20 minutes)",
                "Regular moderate exercise",
                "Strength training 2-3 times per week",
            ],
            lifestyle: &[
                "Focus on whole foods and vegetables",
                "Limit refined carbohydrates",
                "Stay well-hydrated",
            ],
            tips: &[
                "Elevated glucose detected",
                "Physical activity helps regulate blood sugar",
            ],
        },
    }
}

fn breathing_content(status: BreathingStatus) -> Content {
    match status {
        BreathingStatus::Normal => Content {
            exercises: &[
                "Deep breathing exercises (5 min daily)",
                "Continue current activity level",
            ],
            lifestyle: &[
                "Maintain good air quality in living spaces",
                "Stay active and mobile",
            ],
            tips: &[
                "Breathing pattern is healthy!",
                "Keep practicing good breathing habits",
            ],
        },
        BreathingStatus::ShallowBreathing => Content {
            exercises: &[
                "Diaphragmatic breathing: Breathe deeply into belly (5-10 min, 3x/day)",
                "Box breathing: Inhale 4s, hold 4s, exhale 4s, hold 4s",
                "Gentle chest expansion exercises",
            ],
            lifestyle: &[
                "Practice good posture while sitting",
                "Take breathing breaks every hour",
                "Avoid restrictive clothing",
            ],
            tips: &[
                "Shallow breathing detected - focus on deep breaths",
                "Your lungs can hold more air with practice",
            ],
        },
        BreathingStatus::Irregular => Content {
            exercises: &[
                "Paced breathing: Count to 4 on inhale, 6 on exhale",
                "Relaxed breathing exercises",
                "Gentle yoga focusing on breath",
            ],
            lifestyle: &[
                "Reduce stress where possible",
                "Practice mindfulness",
                "Monitor breathing patterns",
            ],
            tips: &[
                "Irregular breathing pattern noticed",
                "Regular practice improves breathing rhythm",
            ],
        },
        BreathingStatus::ApneaRisk => Content {
            exercises: &[
                "Breathing awareness exercises",
                "Gentle aerobic activity",
                "Consult sleep specialist",
            ],
            lifestyle: &[
                "Sleep on your side",
                "Maintain healthy weight",
                "Avoid alcohol before bed",
            ],
            tips: &[
                "Potential apnea risk - medical evaluation recommended",
                "Good sleep position helps breathing",
            ],
        },
    }
}

fn speech_content(pattern: SpeechPattern) -> Content {
    match pattern {
        SpeechPattern::NormalSpeech => Content {
            exercises: &[
                "Continue regular conversation practice",
                "Reading aloud for 10 minutes daily",
            ],
            lifestyle: &["Stay socially engaged", "Maintain communication habits"],
            tips: &[
                "Speech patterns are healthy!",
                "Keep practicing regular communication",
            ],
        },
        SpeechPattern::SlurredSlow => Content {
            exercises: &[
                "Tongue twisters practice (5 min daily)",
                "Exaggerate mouth movements when speaking",
                "Reading aloud slowly and clearly",
                "Facial muscle exercises",
            ],
            lifestyle: &[
                "Speak slowly and deliberately",
                "Take pauses between sentences",
                "Stay well-hydrated",
            ],
            tips: &[
                "Speech clarity exercises will help",
                "Practice makes perfect - be patient with yourself",
            ],
        },
        SpeechPattern::StressedSpeech => Content {
            exercises: &[
                "Breathing exercises before speaking",
                "Practice speaking at slower pace",
                "Relaxation techniques",
                "Mindful communication practice",
            ],
            lifestyle: &[
                "Take breaks during conversations",
                "Practice stress management",
                "Get adequate rest",
            ],
            tips: &[
                "Stress affects speech - relaxation helps",
                "Deep breaths before speaking can help",
            ],
        },
    }
}

fn emotion_content(state: EmotionalState) -> Content {
    match state {
        EmotionalState::Happy => Content {
            exercises: &[
                "Continue activities that bring joy",
                "Share positivity with others",
            ],
            lifestyle: &["Maintain social connections", "Keep up healthy routines"],
            tips: &[
                "Wonderful emotional state!",
                "Your positive energy is valuable",
            ],
        },
        EmotionalState::Neutral => Content {
            exercises: &[
                "Engage in enjoyable activities",
                "Try something new this week",
                "Physical exercise (boosts mood)",
            ],
            lifestyle: &[
                "Connect with friends or family",
                "Practice gratitude daily",
                "Spend time on hobbies",
            ],
            tips: &[
                "Neutral state is normal",
                "Small activities can boost your mood",
            ],
        },
        EmotionalState::Stressed => Content {
            exercises: &[
                "Deep breathing exercises (10 min, 2-3x/day)",
                "Progressive muscle relaxation",
                "Gentle yoga or stretching",
                "Nature walks",
            ],
            lifestyle: &[
                "Prioritize sleep (7-9 hours)",
                "Limit screen time before bed",
                "Talk to someone you trust",
                "Break tasks into smaller steps",
            ],
            tips: &[
                "Stress is manageable with the right tools",
                "Be kind to yourself during difficult times",
            ],
        },
        EmotionalState::Sad => Content {
            exercises: &[
                "Light physical activity (walks, gentle exercise)",
                "Breathing and mindfulness exercises",
                "Creative expression (art, music, writing)",
            ],
            lifestyle: &[
                "Reach out to supportive people",
                "Maintain routine where possible",
                "Consider speaking with a counselor",
                "Engage in small, achievable tasks",
            ],
            tips: &[
                "These feelings are valid and temporary",
                "Support is available - you don't have to go through this alone",
            ],
        },
    }
}

fn posture_content(posture: PostureType) -> Content {
    match posture {
        PostureType::GoodPosture => Content {
            exercises: &[
                "Continue core strengthening exercises",
                "Maintain flexibility with stretching",
            ],
            lifestyle: &[
                "Keep practicing good posture habits",
                "Take movement breaks regularly",
            ],
            tips: &[
                "Excellent posture!",
                "Maintaining good posture prevents future issues",
            ],
        },
        PostureType::ForwardHeadPosture => Content {
            exercises: &[
                "Chin tucks: Pull chin back (10 reps, 3x/day)",
                "Neck stretches: Gentle side-to-side and up-down",
                "Upper back strengthening: Rows and reverse flies",
                "Chest stretches: Doorway stretch (30s, 3 reps)",
            ],
            lifestyle: &[
                "Adjust screen height to eye level",
                "Use ergonomic workspace setup",
                "Set posture check reminders",
                "Avoid prolonged phone use",
            ],
            tips: &[
                "Forward head posture is very common with screen use",
                "Small adjustments make big differences",
            ],
        },
        PostureType::SlouchedSitting => Content {
            exercises: &[
                "Core exercises: Planks, bridges (daily)",
                "Back extensions: Superman pose (10 reps, 2 sets)",
                "Hip flexor stretches (30s each side)",
                "Shoulder blade squeezes (15 reps, 3x/day)",
            ],
            lifestyle: &[
                "Use lumbar support when sitting",
                "Stand up every 30 minutes",
                "Adjust chair height properly",
                "Practice sitting tall with shoulders back",
            ],
            tips: &[
                "Slouching puts stress on your spine",
                "Building core strength helps maintain posture",
            ],
        },
    }
}

/// Bundle for one prediction result
pub fn recommend(result: &PredictionResult) -> RecommendationBundle {
    let modality = result.modality();
    let status = result.label().to_string();
    match result {
        PredictionResult::Heartbeat(p) => heartbeat_content(p.status).into_bundle(modality, status),
        PredictionResult::Glucose(p) => glucose_content(p.range).into_bundle(modality, status),
        PredictionResult::Breathing(p) => breathing_content(p.status).into_bundle(modality, status),
        PredictionResult::Speech(p) => speech_content(p.pattern).into_bundle(modality, status),
        PredictionResult::Emotion(p) => emotion_content(p.state).into_bundle(modality, status),
        PredictionResult::Posture(p) => posture_content(p.posture)
            .into_bundle(modality, posture_status(p.posture.as_str(), p.score)),
    }
}

/// Bundles for every modality present in the prediction set
pub fn recommend_all(predictions: &PredictionSet) -> RecommendationSet {
    predictions
        .iter()
        .map(|result| (result.modality(), recommend(result)))
        .collect()
}

/// Bundle for an untyped label
///
/// An unrecognized label yields a bundle with empty lists whose status is the
/// label as given. Posture statuses carry the score when one is supplied.
pub fn recommend_raw(modality: Modality, label: &str, score: Option<f64>) -> RecommendationBundle {
    let status = match (modality, score) {
        (Modality::Posture, Some(score)) => posture_status(label, score),
        _ => label.to_string(),
    };

    let content = match modality {
        Modality::Heartbeat => HeartbeatStatus::parse_label(label).map(heartbeat_content),
        Modality::Glucose => GlucoseRange::parse_label(label).map(glucose_content),
        Modality::Breathing => BreathingStatus::parse_label(label).map(breathing_content),
        Modality::Speech => SpeechPattern::parse_label(label).map(speech_content),
        Modality::Emotion => EmotionalState::parse_label(label).map(emotion_content),
        Modality::Posture => PostureType::parse_label(label).map(posture_content),
    };

    match content {
        Some(content) => content.into_bundle(modality, status),
        None => {
            log::warn!("No recommendations for {} label {:?}", modality, label);
            RecommendationBundle::empty(title(modality), status)
        }
    }
}

/// Whether a result counts toward the summary's strengths
pub fn is_strength(result: &PredictionResult) -> bool {
    match result {
        PredictionResult::Heartbeat(p) => p.status == HeartbeatStatus::Normal,
        PredictionResult::Glucose(p) => p.range == GlucoseRange::Normal,
        PredictionResult::Breathing(p) => p.status == BreathingStatus::Normal,
        PredictionResult::Speech(p) => p.pattern == SpeechPattern::NormalSpeech,
        PredictionResult::Emotion(p) => {
            !matches!(p.state, EmotionalState::Stressed | EmotionalState::Sad)
        }
        PredictionResult::Posture(p) => p.posture == PostureType::GoodPosture,
    }
}

/// Summary topic for a modality: (as a strength, as an issue)
fn topic(modality: Modality) -> (&'static str, &'static str) {
    match modality {
        Modality::Heartbeat => ("heart health", "heart rhythm"),
        Modality::Glucose => ("glucose control", "blood glucose"),
        Modality::Breathing => ("breathing", "breathing pattern"),
        Modality::Speech => ("communication", "speech clarity"),
        Modality::Emotion => ("emotional state", "emotional wellbeing"),
        Modality::Posture => ("posture", "posture"),
    }
}

/// One-sentence overall summary; never empty
pub fn summary_message(predictions: &PredictionSet) -> String {
    let mut strengths = Vec::new();
    let mut issues = Vec::new();
    for result in predictions.iter() {
        let (strength, issue) = topic(result.modality());
        if is_strength(result) {
            strengths.push(strength);
        } else {
            issues.push(issue);
        }
    }

    let mut message = String::new();
    if !strengths.is_empty() {
        message.push_str(&format!("Great job maintaining {}! ", strengths.join(", ")));
    }

    if !issues.is_empty() {
        message.push_str(&format!(
            "Focus areas for improvement: {}. ",
            issues.join(", ")
        ));
        message.push_str(
            "Follow the recommendations below to support your rehabilitation journey.",
        );
    } else if strengths.is_empty() {
        message.push_str("Keep up your rehabilitation activities and monitor your progress.");
    } else {
        message.push_str("Continue your healthy habits and stay consistent with your routine.");
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EmotionPrediction, GlucosePrediction, HeartbeatPrediction, PosturePrediction,
    };
    use pretty_assertions::assert_eq;

    fn heartbeat(status: HeartbeatStatus) -> PredictionResult {
        PredictionResult::Heartbeat(HeartbeatPrediction {
            status,
            prediction: 0,
            confidence: 0.9,
            heart_rate: 72.0,
            rr_variance: 0.05,
        })
    }

    fn glucose(range: GlucoseRange) -> PredictionResult {
        PredictionResult::Glucose(GlucosePrediction {
            range,
            prediction: 0,
            confidence: 0.9,
            age: 50.0,
            bmi: 24.0,
            meal_timing: 0.0,
            activity_level: 1.0,
        })
    }

    fn emotion(state: EmotionalState) -> PredictionResult {
        PredictionResult::Emotion(EmotionPrediction {
            state,
            prediction: 0,
            confidence: 0.85,
            text_sentiment: 0.5,
            voice_emotion: 0.5,
            facial_emotion: 0.5,
        })
    }

    fn posture(kind: PostureType, score: f64) -> PredictionResult {
        PredictionResult::Posture(PosturePrediction {
            posture: kind,
            prediction: 0,
            score,
            confidence: 0.85,
            head_tilt: 0.0,
            shoulder_alignment: 0.0,
            spine_angle: 90.0,
        })
    }

    fn set(results: Vec<PredictionResult>) -> PredictionSet {
        results.into_iter().collect()
    }

    #[test]
    fn test_bundle_for_tachycardia() {
        let bundle = recommend(&heartbeat(HeartbeatStatus::Tachycardia));

        assert_eq!(bundle.title, "Heart Health");
        assert_eq!(bundle.status, "Tachycardia");
        assert_eq!(bundle.exercises.len(), 3);
        assert_eq!(bundle.tips[0], "Elevated heart rate detected");
    }

    #[test]
    fn test_posture_status_embeds_rounded_score() {
        let bundle = recommend(&posture(PostureType::SlouchedSitting, 42.4));
        assert_eq!(bundle.title, "Posture Health");
        assert_eq!(bundle.status, "Slouched Sitting (Score: 42/100)");
        assert_eq!(bundle.exercises.len(), 4);
    }

    #[test]
    fn test_every_label_has_content() {
        for result in [
            heartbeat(HeartbeatStatus::Irregular),
            glucose(GlucoseRange::Low),
            emotion(EmotionalState::Sad),
            posture(PostureType::ForwardHeadPosture, 70.0),
        ] {
            assert!(!recommend(&result).is_empty());
        }
        for modality in Modality::ALL {
            for label in modality.label_table() {
                assert!(!recommend_raw(modality, label, Some(80.0)).is_empty());
            }
        }
    }

    #[test]
    fn test_recommend_raw_unknown_label() {
        let bundle = recommend_raw(Modality::Heartbeat, "Fibrillation", None);

        assert_eq!(bundle.title, "Heart Health");
        assert_eq!(bundle.status, "Fibrillation");
        assert!(bundle.exercises.is_empty());
        assert!(bundle.lifestyle.is_empty());
        assert!(bundle.tips.is_empty());
    }

    #[test]
    fn test_recommend_raw_matches_typed_path() {
        let typed = recommend(&glucose(GlucoseRange::High));
        let raw = recommend_raw(Modality::Glucose, "High", None);
        assert_eq!(typed, raw);
    }

    #[test]
    fn test_recommend_all_covers_present_modalities() {
        let predictions = set(vec![
            glucose(GlucoseRange::Normal),
            emotion(EmotionalState::Neutral),
        ]);
        let bundles = recommend_all(&predictions);

        assert_eq!(
            bundles.keys().copied().collect::<Vec<_>>(),
            vec![Modality::Glucose, Modality::Emotion]
        );
        assert_eq!(bundles[&Modality::Emotion].title, "Emotional Wellbeing");
    }

    #[test]
    fn test_summary_mixed() {
        let predictions = set(vec![
            heartbeat(HeartbeatStatus::Normal),
            glucose(GlucoseRange::High),
            emotion(EmotionalState::Neutral),
            posture(PostureType::SlouchedSitting, 40.0),
        ]);

        assert_eq!(
            summary_message(&predictions),
            "Great job maintaining heart health, emotional state! \
             Focus areas for improvement: blood glucose, posture. \
             Follow the recommendations below to support your rehabilitation journey."
        );
    }

    #[test]
    fn test_summary_strengths_only() {
        let predictions = set(vec![
            heartbeat(HeartbeatStatus::Normal),
            emotion(EmotionalState::Happy),
        ]);

        assert_eq!(
            summary_message(&predictions),
            "Great job maintaining heart health, emotional state! \
             Continue your healthy habits and stay consistent with your routine."
        );
    }

    #[test]
    fn test_summary_issues_only() {
        let predictions = set(vec![emotion(EmotionalState::Stressed)]);

        assert_eq!(
            summary_message(&predictions),
            "Focus areas for improvement: emotional wellbeing. \
             Follow the recommendations below to support your rehabilitation journey."
        );
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(
            summary_message(&PredictionSet::new()),
            "Keep up your rehabilitation activities and monitor your progress."
        );
    }

    #[test]
    fn test_emotion_strength_rule() {
        assert!(is_strength(&emotion(EmotionalState::Happy)));
        assert!(is_strength(&emotion(EmotionalState::Neutral)));
        assert!(!is_strength(&emotion(EmotionalState::Stressed)));
        assert!(!is_strength(&emotion(EmotionalState::Sad)));
    }
}
