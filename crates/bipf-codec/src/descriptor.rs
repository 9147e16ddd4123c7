//! Resolved field lists for struct types.
//!
//! Resolution runs once per struct type:
//! - `skip` fields are dropped
//! - `flatten` fields (without a rename) are replaced by the fields of the
//!   struct they hold, with their paths prefixed by the flattened field
//! - bindings sharing a serialized name are reduced to the shallowest ones,
//!   then to the tagged ones among those; a unique survivor keeps the name,
//!   otherwise every candidate is dropped
//! - survivors are ordered by path, so promoted fields sit where their
//!   container was declared

use std::any::{Any, TypeId};
use std::collections::HashMap;

use bipf_wire::Result;
use tracing::debug;

use crate::codec::Codec;
use crate::engine::BuildContext;
use crate::reflect::{FieldDesc, Kind, StructDesc, TypeDesc};

/// One hop from a containing value to the value it holds.
#[derive(Clone)]
enum Step {
    Field {
        get: fn(&dyn Any) -> Result<&dyn Any>,
        get_mut: fn(&mut dyn Any) -> Result<&mut dyn Any>,
    },
    Optional {
        get: fn(&dyn Any) -> Result<Option<&dyn Any>>,
        get_or_insert_default: fn(&mut dyn Any) -> Result<&mut dyn Any>,
    },
    Boxed {
        get: fn(&dyn Any) -> Result<&dyn Any>,
        get_mut: fn(&mut dyn Any) -> Result<&mut dyn Any>,
    },
}

/// A serialized struct field.
#[derive(Clone)]
pub struct FieldBinding {
    name: String,
    path: Vec<usize>,
    tagged: bool,
    omit_empty: bool,
    steps: Vec<Step>,
    codec: Codec,
}

impl FieldBinding {
    /// Serialized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field indices from the outer struct down through flattened fields.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// The field's value, or `None` when a flattened optional on the way is empty.
    pub fn get<'v>(&self, mut value: &'v dyn Any) -> Result<Option<&'v dyn Any>> {
        for step in &self.steps {
            value = match step {
                Step::Field { get, .. } | Step::Boxed { get, .. } => get(value)?,
                Step::Optional { get, .. } => match get(value)? {
                    Some(inner) => inner,
                    None => return Ok(None),
                },
            };
        }
        Ok(Some(value))
    }

    /// The field's storage, allocating flattened optionals on the way.
    pub fn get_mut<'v>(&self, mut target: &'v mut dyn Any) -> Result<&'v mut dyn Any> {
        for step in &self.steps {
            target = match step {
                Step::Field { get_mut, .. } | Step::Boxed { get_mut, .. } => get_mut(target)?,
                Step::Optional {
                    get_or_insert_default,
                    ..
                } => get_or_insert_default(target)?,
            };
        }
        Ok(target)
    }
}

/// Ordered, conflict-free field bindings of one struct type.
pub struct StructDescriptor {
    type_name: &'static str,
    bindings: Vec<FieldBinding>,
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

impl StructDescriptor {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(FieldBinding::name)
    }

    /// Binding for an input key: exact match first, then case-insensitive.
    pub fn find(&self, key: &str) -> Option<&FieldBinding> {
        self.exact
            .get(key)
            .or_else(|| self.folded.get(&key.to_lowercase()))
            .map(|&index| &self.bindings[index])
    }

    pub(crate) fn build(
        ctx: &mut BuildContext,
        desc: &TypeDesc,
        fields: &StructDesc,
    ) -> Result<Self> {
        let mut candidates = Vec::new();
        let mut visiting = vec![desc.id];
        collect(ctx, fields, &[], &[], &mut visiting, &mut candidates)?;

        let bindings = resolve(desc.name, candidates);

        let mut exact = HashMap::with_capacity(bindings.len());
        let mut folded = HashMap::with_capacity(bindings.len());
        for (index, binding) in bindings.iter().enumerate() {
            exact.insert(binding.name.clone(), index);
            folded.entry(binding.name.to_lowercase()).or_insert(index);
        }

        Ok(Self {
            type_name: desc.name,
            bindings,
            exact,
            folded,
        })
    }
}

/// The struct reached through a flattened field, with the hops to reach it.
fn flatten_target(field: &FieldDesc, ty: &TypeDesc) -> Option<(TypeDesc, Vec<Step>)> {
    let mut steps = vec![Step::Field {
        get: field.get,
        get_mut: field.get_mut,
    }];
    let mut current = ty.clone();
    loop {
        let next = match &current.kind {
            Kind::Struct(_) => return Some((current, steps)),
            Kind::Optional(opt) => {
                steps.push(Step::Optional {
                    get: opt.get,
                    get_or_insert_default: opt.get_or_insert_default,
                });
                (opt.inner)()
            }
            Kind::Boxed(boxed) => {
                steps.push(Step::Boxed {
                    get: boxed.get,
                    get_mut: boxed.get_mut,
                });
                (boxed.inner)()
            }
            _ => return None,
        };
        current = next;
    }
}

fn collect(
    ctx: &mut BuildContext,
    fields: &StructDesc,
    path: &[usize],
    steps: &[Step],
    visiting: &mut Vec<TypeId>,
    out: &mut Vec<FieldBinding>,
) -> Result<()> {
    for (index, field) in fields.fields.iter().enumerate() {
        if field.skip {
            continue;
        }
        let ty = (field.ty)();

        let mut field_path = path.to_vec();
        field_path.push(index);

        if field.flatten && field.rename.is_none() {
            if let Some((inner, hops)) = flatten_target(field, &ty) {
                if visiting.contains(&inner.id) {
                    debug!(field = field.name, "skipping recursive flatten");
                    continue;
                }
                let Kind::Struct(inner_fields) = &inner.kind else {
                    continue;
                };
                let mut inner_steps = steps.to_vec();
                inner_steps.extend(hops);

                visiting.push(inner.id);
                collect(ctx, inner_fields, &field_path, &inner_steps, visiting, out)?;
                visiting.pop();
                continue;
            }
        }

        let codec = ctx
            .codec(&ty)
            .map_err(|err| err.in_field(field.wire_name()))?;
        let mut field_steps = steps.to_vec();
        field_steps.push(Step::Field {
            get: field.get,
            get_mut: field.get_mut,
        });

        out.push(FieldBinding {
            name: field.wire_name().to_string(),
            path: field_path,
            tagged: field.is_tagged(),
            omit_empty: field.omit_empty,
            steps: field_steps,
            codec,
        });
    }
    Ok(())
}

fn resolve(type_name: &str, candidates: Vec<FieldBinding>) -> Vec<FieldBinding> {
    let mut by_name: HashMap<String, Vec<FieldBinding>> = HashMap::new();
    for candidate in candidates {
        by_name
            .entry(candidate.name.clone())
            .or_default()
            .push(candidate);
    }

    let mut survivors = Vec::with_capacity(by_name.len());
    for (name, group) in by_name {
        match dominant(group) {
            Some(binding) => survivors.push(binding),
            None => debug!(type_name, field = %name, "dropping ambiguous field"),
        }
    }

    survivors.sort_by(|a, b| a.path.cmp(&b.path));
    survivors
}

fn dominant(mut group: Vec<FieldBinding>) -> Option<FieldBinding> {
    if group.len() == 1 {
        return group.pop();
    }

    let shallowest = group.iter().map(FieldBinding::depth).min()?;
    group.retain(|b| b.depth() == shallowest);
    if group.iter().any(|b| b.tagged) {
        group.retain(|b| b.tagged);
    }

    if group.len() == 1 {
        group.pop()
    } else {
        None
    }
}
