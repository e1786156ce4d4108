use std::path::PathBuf;

use gremlin_build::schema::*;
use gremlin_build::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    Config::new().out_dir(out_dir.join("lenient")).generate(&conformance_schema())?;
    Config::new()
        .out_dir(out_dir.join("strict"))
        .strict_enums()
        .generate(&strict_schema())?;
    Ok(())
}

fn conformance_schema() -> Schema {
    Schema::new()
        .file(common_proto())
        .file(example_proto())
        .file(legacy_proto())
}

fn common_proto() -> ProtoFile {
    ProtoFile::new("common.proto")
        .package("common")
        .enumeration(
            EnumDefinition::new("Status")
                .value("STATUS_UNKNOWN", 0)
                .value("STATUS_ACTIVE", 1)
                .value("STATUS_SUSPENDED", 2),
        )
        .message(
            MessageDefinition::new("Address")
                .field(FieldDefinition::new("city", 1, ScalarType::String))
                .field(FieldDefinition::new("street", 2, ScalarType::String))
                .field(FieldDefinition::new("zip", 3, ScalarType::Uint32)),
        )
}

fn example_proto() -> ProtoFile {
    ProtoFile::new("example.proto")
        .package("example")
        .import("common.proto")
        .message(user())
        .message(
            MessageDefinition::new("Sample")
                .field(FieldDefinition::new("id", 1, ScalarType::Int32))
                .field(FieldDefinition::new("name", 2, ScalarType::String))
                .field(FieldDefinition::new("tags", 3, ScalarType::String).repeated()),
        )
        .message(all_scalars())
        .message(
            MessageDefinition::new("Node")
                .field(FieldDefinition::new("value", 1, ScalarType::Int64))
                .field(FieldDefinition::new("next", 2, FieldType::message(".example.Node")))
                .field(FieldDefinition::new("children", 3, FieldType::message(".example.Node")).repeated()),
        )
        // Level1 -> Level2 -> Level3 -> Level4.
        .message(level("Level1", Some(".example.Level2")))
        .message(level("Level2", Some(".example.Level3")))
        .message(level("Level3", Some(".example.Level4")))
        .message(level("Level4", None))
}

fn user() -> MessageDefinition {
    let settings = MessageDefinition::new("Settings")
        .enumeration(
            EnumDefinition::new("Theme")
                .value("THEME_LIGHT", 0)
                .value("THEME_DARK", 1),
        )
        .field(FieldDefinition::new("dark_mode", 1, ScalarType::Bool))
        .field(FieldDefinition::new(
            "theme",
            2,
            FieldType::enumeration(".example.User.Profile.Settings.Theme"),
        ));
    let profile = MessageDefinition::new("Profile")
        .message(settings)
        .field(FieldDefinition::new("bio", 1, ScalarType::String))
        .field(FieldDefinition::new(
            "settings",
            2,
            FieldType::message(".example.User.Profile.Settings"),
        ));

    MessageDefinition::new("User")
        .message(profile)
        .oneof("contact")
        .field(FieldDefinition::new("id", 1, ScalarType::Int64))
        .field(FieldDefinition::new("name", 2, ScalarType::String))
        .field(FieldDefinition::new("nickname", 3, ScalarType::String).optional())
        .field(FieldDefinition::new("address", 4, FieldType::message(".common.Address")))
        .field(FieldDefinition::new("scores", 5, ScalarType::Int32).repeated())
        .field(FieldDefinition::new("legacy_scores", 6, ScalarType::Int32).repeated().packed(false))
        .field(FieldDefinition::new("tags", 7, ScalarType::String).repeated())
        .field(FieldDefinition::new("counters", 8, FieldType::map(ScalarType::String, ScalarType::Int64)))
        .field(FieldDefinition::new(
            "addresses_by_id",
            9,
            FieldType::map(ScalarType::Int32, FieldType::message(".common.Address")),
        ))
        .field(FieldDefinition::new("status", 10, FieldType::enumeration(".common.Status")))
        .field(FieldDefinition::new("email", 11, ScalarType::String).in_oneof(0))
        .field(FieldDefinition::new("phone", 12, ScalarType::Uint64).in_oneof(0))
        .field(FieldDefinition::new("office", 13, FieldType::message(".common.Address")).in_oneof(0))
        .field(FieldDefinition::new("avatar", 14, ScalarType::Bytes))
        .field(FieldDefinition::new("profile", 15, FieldType::message(".example.User.Profile")))
}

fn all_scalars() -> MessageDefinition {
    let scalars = [
        ("f_double", ScalarType::Double),
        ("f_float", ScalarType::Float),
        ("f_int32", ScalarType::Int32),
        ("f_int64", ScalarType::Int64),
        ("f_uint32", ScalarType::Uint32),
        ("f_uint64", ScalarType::Uint64),
        ("f_sint32", ScalarType::Sint32),
        ("f_sint64", ScalarType::Sint64),
        ("f_fixed32", ScalarType::Fixed32),
        ("f_fixed64", ScalarType::Fixed64),
        ("f_sfixed32", ScalarType::Sfixed32),
        ("f_sfixed64", ScalarType::Sfixed64),
        ("f_bool", ScalarType::Bool),
        ("f_string", ScalarType::String),
        ("f_bytes", ScalarType::Bytes),
    ];
    let mut message = MessageDefinition::new("AllScalars");
    for (tag, (name, ty)) in (1..).zip(scalars) {
        message = message.field(FieldDefinition::new(name, tag, ty));
    }
    message
        .field(FieldDefinition::new("r_sint64", 16, ScalarType::Sint64).repeated())
        .field(FieldDefinition::new("r_fixed32", 17, ScalarType::Fixed32).repeated())
        .field(FieldDefinition::new("r_double", 18, ScalarType::Double).repeated())
        .field(FieldDefinition::new("r_bool", 19, ScalarType::Bool).repeated())
        .field(FieldDefinition::new("r_bytes", 20, ScalarType::Bytes).repeated())
}

fn level(name: &str, next: Option<&str>) -> MessageDefinition {
    let message = MessageDefinition::new(name).field(FieldDefinition::new("value", 2, ScalarType::Int32));
    match next {
        Some(next) => message.field(FieldDefinition::new("next", 1, FieldType::message(next))),
        None => message.field(FieldDefinition::new("leaf", 1, ScalarType::String)),
    }
}

fn legacy_proto() -> ProtoFile {
    ProtoFile::new("legacy.proto")
        .package("legacy")
        .syntax(Syntax::Proto2)
        .enumeration(
            EnumDefinition::new("Level")
                .value("LEVEL_LOW", 1)
                .value("LEVEL_HIGH", 2),
        )
        .message(
            MessageDefinition::new("Legacy")
                .field(FieldDefinition::new("id", 1, ScalarType::Int32).required())
                .field(FieldDefinition::new("name", 2, ScalarType::String).default_value("anon"))
                .field(FieldDefinition::new("retries", 3, ScalarType::Int32).default_value("3"))
                .field(FieldDefinition::new("level", 4, FieldType::enumeration(".legacy.Level")).default_value("LEVEL_HIGH"))
                .field(FieldDefinition::new("values", 5, ScalarType::Int32).repeated())
                .field(FieldDefinition::new("raw", 6, ScalarType::Int32).repeated().packed(false))
                .field(FieldDefinition::new("ratio", 7, ScalarType::Double).default_value("-1.5"))
                .field(FieldDefinition::new("plain", 8, ScalarType::Int32)),
        )
}

fn strict_schema() -> Schema {
    Schema::new().file(
        ProtoFile::new("paint.proto")
            .package("paint")
            .enumeration(
                EnumDefinition::new("Color")
                    .value("COLOR_RED", 0)
                    .value("COLOR_GREEN", 1),
            )
            .message(
                MessageDefinition::new("Paint")
                    .field(FieldDefinition::new("color", 1, FieldType::enumeration(".paint.Color")))
                    .field(FieldDefinition::new("palette", 2, FieldType::enumeration(".paint.Color")).repeated())
                    .field(FieldDefinition::new("code", 3, ScalarType::Int32)),
            ),
    )
}
