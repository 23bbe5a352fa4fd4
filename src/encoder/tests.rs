use super::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TINY_HIDDEN: usize = 8;
const TINY_MAX_POSITIONS: usize = 32;

const TINY_VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "my", "credit", "card", "was", "charged", "twice",
    "for", "the", "same", "purchase", "app", "keeps", "crashing", "login", "refund",
];

/// Writes a randomly initialized 1-layer BERT plus a WordPiece tokenizer.
fn write_tiny_bert(dir: &Path) {
    use candle_nn::{VarBuilder, VarMap};
    use candle_transformers::models::bert::{BertModel, Config};

    let config_json = serde_json::json!({
        "vocab_size": TINY_VOCAB.len(),
        "hidden_size": TINY_HIDDEN,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.0,
        "max_position_embeddings": TINY_MAX_POSITIONS,
        "type_vocab_size": 2,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-12,
        "pad_token_id": 0,
        "position_embedding_type": "absolute",
        "use_cache": true,
        "classifier_dropout": null,
        "model_type": "bert"
    });
    std::fs::write(
        dir.join("config.json"),
        serde_json::to_string_pretty(&config_json).unwrap(),
    )
    .unwrap();

    let config: Config = serde_json::from_value(config_json).unwrap();
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    BertModel::load(vb, &config).expect("build tiny bert");
    varmap.save(dir.join("model.safetensors")).unwrap();

    let vocab: serde_json::Map<String, serde_json::Value> = TINY_VOCAB
        .iter()
        .enumerate()
        .map(|(id, token)| (token.to_string(), serde_json::json!(id)))
        .collect();
    let added_tokens: Vec<serde_json::Value> = TINY_VOCAB[..4]
        .iter()
        .enumerate()
        .map(|(id, token)| {
            serde_json::json!({
                "id": id,
                "content": token,
                "single_word": false,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true
            })
        })
        .collect();
    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": { "type": "BertPreTokenizer" },
        "post_processor": {
            "type": "BertProcessing",
            "sep": ["[SEP]", 3],
            "cls": ["[CLS]", 2]
        },
        "decoder": null,
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab
        }
    });
    std::fs::write(
        dir.join("tokenizer.json"),
        serde_json::to_string(&tokenizer_json).unwrap(),
    )
    .unwrap();
}

fn tiny_bert_config(dir: &Path) -> EncoderConfig {
    EncoderConfig::new(dir)
        .with_device(DevicePreference::Cpu)
        .with_max_tokens(16)
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_encoder_config_default() {
        let config = EncoderConfig::default();
        assert_eq!(config.max_tokens, 128);
        assert_eq!(config.embedding_dim, 768);
        assert_eq!(config.model_id, "bert-base-uncased");
        assert_eq!(config.device, DevicePreference::Auto);
        assert!(!config.testing_stub);
        assert!(config.model_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_encoder_config_paths() {
        let config = EncoderConfig::new("/models/bert");
        assert_eq!(config.config_path(), PathBuf::from("/models/bert/config.json"));
        assert_eq!(
            config.weights_path(),
            PathBuf::from("/models/bert/model.safetensors")
        );
        assert_eq!(
            config.tokenizer_path(),
            PathBuf::from("/models/bert/tokenizer.json")
        );
    }

    #[test]
    fn test_encoder_config_stub_validates() {
        assert!(EncoderConfig::stub().validate().is_ok());
    }

    #[test]
    fn test_encoder_config_stub_zero_dim_rejected() {
        let config = EncoderConfig::stub().with_embedding_dim(0);
        assert!(matches!(
            config.validate(),
            Err(EncoderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_encoder_config_small_max_tokens_rejected() {
        let config = EncoderConfig::stub().with_max_tokens(1);
        assert!(matches!(
            config.validate(),
            Err(EncoderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_encoder_config_empty_dir_rejected() {
        let config = EncoderConfig::default();
        assert!(matches!(
            config.validate(),
            Err(EncoderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_encoder_config_missing_dir() {
        let config = EncoderConfig::new("/nonexistent/bert");
        match config.validate() {
            Err(EncoderError::ModelNotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/bert"))
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_encoder_config_missing_tokenizer() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("model.safetensors"), b"").unwrap();

        match EncoderConfig::new(dir.path()).validate() {
            Err(EncoderError::ModelNotFound { path }) => {
                assert!(path.ends_with("tokenizer.json"))
            }
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
    }
}

mod device_tests {
    use super::*;

    #[test]
    fn test_device_preference_parse() {
        assert_eq!(DevicePreference::parse("auto"), Some(DevicePreference::Auto));
        assert_eq!(DevicePreference::parse(" CPU "), Some(DevicePreference::Cpu));
        assert_eq!(DevicePreference::parse("Cuda"), Some(DevicePreference::Cuda));
        assert_eq!(DevicePreference::parse("metal"), Some(DevicePreference::Metal));
        assert_eq!(DevicePreference::parse("gpu"), None);
        assert_eq!(DevicePreference::parse(""), None);
    }

    #[test]
    fn test_device_preference_display_round_trips() {
        for pref in [
            DevicePreference::Auto,
            DevicePreference::Cpu,
            DevicePreference::Cuda,
            DevicePreference::Metal,
        ] {
            assert_eq!(DevicePreference::parse(&pref.to_string()), Some(pref));
        }
    }

    #[test]
    fn test_select_cpu() {
        let device = select_device(DevicePreference::Cpu).unwrap();
        assert!(device.is_cpu());
        assert_eq!(device_label(&device), "cpu");
    }

    #[test]
    fn test_select_auto_never_fails() {
        assert!(select_device(DevicePreference::Auto).is_ok());
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_required_cuda_without_backend_is_fatal() {
        match select_device(DevicePreference::Cuda) {
            Err(EncoderError::DeviceUnavailable { device, .. }) => assert_eq!(device, "cuda"),
            other => panic!("expected DeviceUnavailable, got {:?}", other),
        }
    }

    #[cfg(not(feature = "metal"))]
    #[test]
    fn test_required_metal_without_backend_is_fatal() {
        match select_device(DevicePreference::Metal) {
            Err(EncoderError::DeviceUnavailable { device, .. }) => assert_eq!(device, "metal"),
            other => panic!("expected DeviceUnavailable, got {:?}", other),
        }
    }
}

mod stub_tests {
    use super::*;

    #[test]
    fn test_stub_encoder_loads() {
        let encoder = BertEncoder::stub().unwrap();
        assert!(encoder.is_stub());
        assert_eq!(encoder.embedding_dim(), 768);
        assert_eq!(encoder.model_id(), "bert-base-uncased");
    }

    #[test]
    fn test_stub_embedding_dimension() {
        let encoder = BertEncoder::load(EncoderConfig::stub().with_embedding_dim(32)).unwrap();
        let embedding = encoder.embed("refund please").unwrap();
        assert_eq!(embedding.len(), 32);
        assert!(embedding.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_stub_embedding_deterministic() {
        let encoder = BertEncoder::stub().unwrap();
        let a = encoder.embed("my app keeps crashing").unwrap();
        let b = encoder.embed("my app keeps crashing").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stub_embedding_differs_by_text() {
        let encoder = BertEncoder::stub().unwrap();
        let a = encoder.embed("login").unwrap();
        let b = encoder.embed("refund").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_stub_batch_matches_single() {
        let encoder = BertEncoder::stub().unwrap();
        let texts = ["one", "two", "three"];
        let batch = encoder.embed_batch(&texts).unwrap();
        assert_eq!(batch.len(), 3);
        for (text, embedding) in texts.iter().zip(&batch) {
            assert_eq!(&encoder.embed(text).unwrap(), embedding);
        }
    }

    #[test]
    fn test_embed_batch_empty() {
        let encoder = BertEncoder::stub().unwrap();
        assert!(encoder.embed_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_encoder_debug_format() {
        let encoder = BertEncoder::stub().unwrap();
        let debug = format!("{:?}", encoder);
        assert!(debug.contains("BertEncoder"));
        assert!(debug.contains("Stub"));
    }
}

mod model_tests {
    use super::*;

    #[test]
    fn test_load_tiny_bert() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());

        let encoder = BertEncoder::load(tiny_bert_config(dir.path())).unwrap();
        assert!(!encoder.is_stub());
        assert_eq!(encoder.embedding_dim(), TINY_HIDDEN);
        assert!(encoder.device().is_cpu());
    }

    #[test]
    fn test_tiny_bert_embedding_shape_and_determinism() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());
        let encoder = BertEncoder::load(tiny_bert_config(dir.path())).unwrap();

        let a = encoder
            .embed("my credit card was charged twice for the same purchase")
            .unwrap();
        let b = encoder
            .embed("my credit card was charged twice for the same purchase")
            .unwrap();

        assert_eq!(a.len(), TINY_HIDDEN);
        assert!(a.iter().all(|v| v.is_finite()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_tiny_bert_empty_text_still_has_cls() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());
        let encoder = BertEncoder::load(tiny_bert_config(dir.path())).unwrap();

        let embedding = encoder.embed("").unwrap();
        assert_eq!(embedding.len(), TINY_HIDDEN);
    }

    #[test]
    fn test_tiny_bert_truncates_long_input() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());
        let encoder = BertEncoder::load(tiny_bert_config(dir.path())).unwrap();

        // Far more tokens than the model has positions; truncation keeps it valid.
        let long = "refund ".repeat(200);
        let embedding = encoder.embed(&long).unwrap();
        assert_eq!(embedding.len(), TINY_HIDDEN);
    }

    #[test]
    fn test_tiny_bert_batch_padding_matches_single() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());
        let encoder = BertEncoder::load(tiny_bert_config(dir.path())).unwrap();

        let short = "refund";
        let long = "my credit card was charged twice";
        let batch = encoder.embed_batch(&[short, long]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_close(&batch[0], &encoder.embed(short).unwrap());
        assert_close(&batch[1], &encoder.embed(long).unwrap());
    }

    #[test]
    fn test_max_tokens_beyond_positions_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());

        let config = tiny_bert_config(dir.path()).with_max_tokens(TINY_MAX_POSITIONS + 1);
        match BertEncoder::load(config) {
            Err(EncoderError::InvalidConfig { reason }) => {
                assert!(reason.contains("max_position_embeddings"))
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_weights_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());
        std::fs::write(dir.path().join("model.safetensors"), b"not safetensors").unwrap();

        assert!(matches!(
            BertEncoder::load(tiny_bert_config(dir.path())),
            Err(EncoderError::ModelLoadFailed { .. })
        ));
    }

    #[test]
    fn test_corrupt_tokenizer_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tiny_bert(dir.path());
        std::fs::write(dir.path().join("tokenizer.json"), b"{ broken").unwrap();

        assert!(matches!(
            BertEncoder::load(tiny_bert_config(dir.path())),
            Err(EncoderError::ModelLoadFailed { .. })
        ));
    }

    #[test]
    fn test_missing_model_dir_is_fatal() {
        assert!(matches!(
            BertEncoder::load(EncoderConfig::new("/nonexistent/bert")),
            Err(EncoderError::ModelNotFound { .. })
        ));
    }
}

mod mock_tests {
    use super::*;

    #[test]
    fn test_mock_returns_scripted_vector() {
        let encoder = MockEncoder::new(3).with_vector("hello", vec![1.0, 2.0, 3.0]);
        assert_eq!(encoder.embed("hello").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(encoder.embed("other").unwrap().len(), 3);
        assert_eq!(encoder.call_count(), 2);
    }

    #[test]
    fn test_mock_failing_on() {
        let encoder = MockEncoder::new(3).failing_on("bad");
        assert!(matches!(
            encoder.embed("bad"),
            Err(EncoderError::TokenizationFailed { .. })
        ));
        assert!(encoder.embed("good").is_ok());
    }

    #[test]
    fn test_mock_failing_always() {
        let encoder = MockEncoder::new(3).failing_always();
        assert!(matches!(
            encoder.embed("anything"),
            Err(EncoderError::InferenceFailed { .. })
        ));
    }

    #[test]
    fn test_mock_batch_fails_if_any_item_fails() {
        let encoder = MockEncoder::new(3).failing_on("bad");
        assert!(encoder.embed_batch(&["good", "bad"]).is_err());
    }
}

#[test]
fn test_encoder_error_display() {
    let err = EncoderError::DeviceUnavailable {
        device: "cuda".to_string(),
        reason: "no driver".to_string(),
    };
    assert_eq!(err.to_string(), "cuda device unavailable: no driver");

    let err = EncoderError::ModelNotFound {
        path: PathBuf::from("/models/bert"),
    };
    assert!(err.to_string().contains("/models/bert"));
}
