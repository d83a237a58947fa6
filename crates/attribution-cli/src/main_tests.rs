// crates/attribution-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Unit Tests
// Description: Tests for argument parsing and key command helpers.
// Purpose: Keep offline key tooling aligned with the HTTP codec.
// Dependencies: attribution-cli, clap, tempfile
// ============================================================================

//! ## Overview
//! Exercises command parsing and the pure helpers behind `key` and `config`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use clap::Parser;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::ConfigValidateCommand;
use super::DecodeCommand;
use super::EncodeSourceCommand;
use super::EncodeTriggerCommand;
use super::IdCommand;
use super::IdNewCommand;
use super::KeyCommand;
use super::LayoutArg;
use super::command_config;
use super::command_id;
use super::decode_command;
use super::encode_source_command;
use super::encode_trigger_command;
use super::output_error;
use super::render_schema;

fn source_args(item_id: &str) -> EncodeSourceCommand {
    EncodeSourceCommand {
        source_type: "click".to_string(),
        advertiser: "shop".to_string(),
        publisher: "news".to_string(),
        item_id: item_id.to_string(),
        dimension: "quantity".to_string(),
    }
}

#[test]
fn encode_source_matches_reference_layout() {
    let piece = encode_source_command(&source_args("1")).unwrap();
    assert_eq!(piece.to_string(), "0x00010100000001010000000000000000");
}

#[test]
fn encode_source_rejects_unknown_advertiser() {
    let mut args = source_args("1");
    args.advertiser = "bank".to_string();
    let err = encode_source_command(&args).unwrap_err();
    assert!(err.to_string().contains("bank"));
}

#[test]
fn encode_source_rejects_wide_item_id() {
    let err = encode_source_command(&source_args("0x100000000")).unwrap_err();
    assert!(err.to_string().contains("item_id"));
}

#[test]
fn encode_trigger_packs_low_half() {
    let piece = encode_trigger_command(&EncodeTriggerCommand {
        trigger_type: "quantity".to_string(),
        item_id: "1".to_string(),
        size: "3".to_string(),
        category: "4".to_string(),
        option: "0".to_string(),
    })
    .unwrap();
    assert_eq!(piece.to_string(), "0x00000000000000000000000001030400");
}

#[test]
fn encode_trigger_rejects_non_decimal_size() {
    let err = encode_trigger_command(&EncodeTriggerCommand {
        trigger_type: "gross".to_string(),
        item_id: "1".to_string(),
        size: "x".to_string(),
        category: "4".to_string(),
        option: "0".to_string(),
    })
    .unwrap_err();
    assert!(err.to_string().contains("size"));
}

#[test]
fn decode_renders_both_halves() {
    let rendered = decode_command(&DecodeCommand {
        key: "0x00010100000001010000000001030400".to_string(),
        layout: LayoutArg::Combined,
    })
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    let text = value.to_string();
    assert!(text.contains("\"shop\""));
    assert!(text.contains("\"quantity\""));
}

#[test]
fn decode_rejects_malformed_key() {
    assert!(
        decode_command(&DecodeCommand {
            key: "00ff".to_string(),
            layout: LayoutArg::Source,
        })
        .is_err()
    );
}

#[test]
fn schema_lists_every_field() {
    let rendered = render_schema();
    for name in ["source_type", "advertiser", "publisher", "dimension", "trigger_type", "option"] {
        assert!(rendered.contains(name), "missing {name}");
    }
    assert!(rendered.contains("bits 127..64"));
    assert!(rendered.contains("bits 63..0"));
}

#[test]
fn id_count_is_bounded() {
    assert!(
        command_id(&IdCommand::New(IdNewCommand {
            count: 0,
        }))
        .is_err()
    );
    assert!(
        command_id(&IdCommand::New(IdNewCommand {
            count: 100_000,
        }))
        .is_err()
    );
}

#[test]
fn config_validate_reports_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attribution-ssp.toml");
    fs::write(&path, "[registration]\ndestination_template = \"https://static.example\"\n")
        .unwrap();
    let err = command_config(&ConfigCommand::Validate(ConfigValidateCommand {
        config: Some(path),
    }))
    .unwrap_err();
    assert!(err.to_string().starts_with("failed to load config"));
}

#[test]
fn cli_parses_key_decode_layout() {
    let cli =
        Cli::try_parse_from(["attribution-ssp", "key", "decode", "--layout", "trigger", "0x01"])
            .unwrap();
    let Commands::Key {
        command: KeyCommand::Decode(command),
    } = cli.command
    else {
        panic!("expected key decode");
    };
    assert_eq!(command.layout, LayoutArg::Trigger);
    assert_eq!(command.key, "0x01");
}

#[test]
fn output_error_names_stream() {
    let err = std::io::Error::other("closed");
    assert_eq!(output_error("stdout", &err), "failed to write to stdout: closed");
}
