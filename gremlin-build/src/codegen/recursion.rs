//! Recursive type detection for automatic boxing.
//!
//! Protobuf messages can have recursive definitions, either directly:
//! ```protobuf
//! message Node {
//!   optional Node child = 1;
//! }
//! ```
//!
//! Or indirectly:
//! ```protobuf
//! message A {
//!   optional B b = 1;
//! }
//! message B {
//!   optional A a = 1;
//! }
//! ```
//!
//! Both the owned struct and the reader hold singular message fields inline,
//! so a cycle of singular fields would have infinite size. Repeated and map
//! fields already sit behind a heap allocation and never need boxing.

use std::collections::{HashMap, HashSet};

use crate::schema::{FieldType, Label, MessageDefinition, Schema};

/// A field that needs to be boxed to break a recursive cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecursiveField {
    /// Fully-qualified name of the containing message (e.g., ".mypackage.Node").
    pub message_fqn: String,
    /// Name of the field that needs boxing.
    pub field_name: String,
}

/// Message fqn -> (field name, referenced message fqn) for every singular
/// message field.
type Graph = HashMap<String, Vec<(String, String)>>;

/// Analyze a schema for recursive types and return fields that need boxing.
pub fn find_recursive_fields(schema: &Schema) -> HashSet<RecursiveField> {
    let mut result = HashSet::new();
    let mut graph = Graph::new();

    for file in &schema.files {
        let prefix = file.type_prefix();
        for message in &file.messages {
            collect_message_edges(&mut graph, &prefix, message);
        }
    }

    for message_fqn in graph.keys() {
        let mut in_path = HashSet::new();
        in_path.insert(message_fqn.clone());
        dfs_find_cycles(&graph, message_fqn, message_fqn, &mut in_path, &mut result);
    }

    result
}

fn collect_message_edges(graph: &mut Graph, prefix: &str, message: &MessageDefinition) {
    let message_fqn = format!("{}{}", prefix, message.name);

    let edges = message
        .fields
        .iter()
        .filter(|field| field.label != Label::Repeated)
        .filter_map(|field| match &field.ty {
            FieldType::Message(type_name) => Some((field.name.clone(), type_name.clone())),
            _ => None,
        })
        .collect();
    graph.insert(message_fqn.clone(), edges);

    let nested_prefix = format!("{}.", message_fqn);
    for nested in &message.messages {
        collect_message_edges(graph, &nested_prefix, nested);
    }
}

/// DFS to find cycles. `in_path` tracks nodes in the current DFS path.
fn dfs_find_cycles(
    graph: &Graph,
    current: &str,
    target: &str,
    in_path: &mut HashSet<String>,
    result: &mut HashSet<RecursiveField>,
) {
    let Some(edges) = graph.get(current) else {
        return;
    };

    for (field_name, referenced_type) in edges {
        if referenced_type == target {
            // This field closes the cycle back to `target`.
            result.insert(RecursiveField {
                message_fqn: current.to_string(),
                field_name: field_name.clone(),
            });
            continue;
        }

        if in_path.contains(referenced_type) {
            continue;
        }

        in_path.insert(referenced_type.clone());
        dfs_find_cycles(graph, referenced_type, target, in_path, result);
        in_path.remove(referenced_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, ProtoFile, ScalarType};

    fn schema(messages: Vec<MessageDefinition>) -> Schema {
        let file = messages
            .into_iter()
            .fold(ProtoFile::new("test.proto").package("test"), ProtoFile::message);
        Schema::new().file(file)
    }

    fn recursive(message: &str, field: &str) -> RecursiveField {
        RecursiveField {
            message_fqn: message.to_string(),
            field_name: field.to_string(),
        }
    }

    #[test]
    fn test_direct_recursion() {
        let fields = find_recursive_fields(&schema(vec![MessageDefinition::new("Node")
            .field(FieldDefinition::new("child", 1, FieldType::message(".test.Node")))]));
        assert!(fields.contains(&recursive(".test.Node", "child")));
    }

    #[test]
    fn test_indirect_recursion() {
        let fields = find_recursive_fields(&schema(vec![
            MessageDefinition::new("A").field(FieldDefinition::new("b", 1, FieldType::message(".test.B"))),
            MessageDefinition::new("B").field(FieldDefinition::new("a", 1, FieldType::message(".test.A"))),
        ]));
        assert!(
            fields.contains(&recursive(".test.A", "b")) || fields.contains(&recursive(".test.B", "a")),
            "At least one field in the cycle should be boxed"
        );
    }

    #[test]
    fn test_repeated_edges_do_not_recurse() {
        let fields = find_recursive_fields(&schema(vec![MessageDefinition::new("Tree").field(
            FieldDefinition::new("children", 1, FieldType::message(".test.Tree")).repeated(),
        )]));
        assert!(fields.is_empty());
    }

    #[test]
    fn test_no_recursion() {
        let fields = find_recursive_fields(&schema(vec![
            MessageDefinition::new("A").field(FieldDefinition::new("b", 1, FieldType::message(".test.B"))),
            MessageDefinition::new("B").field(FieldDefinition::new("x", 1, ScalarType::Int32)),
        ]));
        assert!(fields.is_empty(), "No fields should need boxing");
    }
}
