use crate::error::{ModelError, ModelResult};
use forge_tdl::{OperandKind, TargetOutput};
use indexmap::IndexMap;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterClass {
    pub id: usize,
    pub name: String,
}

/// A register record. `parent`/`child` form a width-nested aliasing
/// chain (e.g. `AL ⊂ AX ⊂ EAX ⊂ RAX`): each register has at most one
/// parent and at most one child, never more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub id: usize,
    pub name: String,
    pub class: usize,
    pub width_bits: u32,
    pub parent: Option<usize>,
    pub child: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    pub name: String,
    pub width_bits: u32,
    pub default: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub name: String,
    pub fields: Vec<DataField>,
}

/// A formatee already resolved to the operand it names, rather than a
/// bare binding-name string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormatee {
    pub operand_index: usize,
    pub accessor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    pub fmt_string: String,
    pub formatees: Vec<ResolvedFormatee>,
}

/// An instruction template: operand slots plus a format string, not yet
/// bound to concrete registers (binding happens in the selector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub id: usize,
    pub name: String,
    pub operands: Vec<OperandKind>,
    pub result_operand_ref: Option<usize>,
    pub clobbers: SmallVec<[usize; 6]>,
    pub format: Option<ResolvedFormat>,
}

impl Instruction {
    pub fn operand_index_for_binding(&self, binding: &str) -> Option<usize> {
        self.operands.iter().position(|op| op.binding_name() == binding)
    }
}

/// The in-memory target model built from a parsed `TargetOutput`.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetModel {
    pub classes: IndexMap<String, RegisterClass>,
    pub registers: IndexMap<String, Register>,
    pub data: IndexMap<String, DataEntry>,
    pub extensions: Vec<String>,
    pub instrs: IndexMap<String, Instruction>,
}

impl TargetModel {
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }

    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    pub fn class(&self, name: &str) -> Option<&RegisterClass> {
        self.classes.get(name)
    }

    pub fn instruction(&self, name: &str) -> Option<&Instruction> {
        self.instrs.get(name)
    }

    /// Registers belonging to `class`, widest-to-narrowest order is not
    /// guaranteed; callers that need a narrowest-first tie-break should
    /// sort by `width_bits`.
    pub fn registers_in_class(&self, class: &str) -> Vec<&Register> {
        self.registers.values().filter(|r| r.class == self.classes.get(class).map(|c| c.id).unwrap_or(usize::MAX)).collect()
    }
}

/// Build a [`TargetModel`] from a parsed [`TargetOutput`], validating
/// what parsing itself defers: every `result`/`clobber` resolves to a
/// declared operand, `clobbers.len() <= 6`, and every register `class`
/// names a declared regclass.
pub fn build(output: &TargetOutput) -> ModelResult<TargetModel> {
    let mut model = TargetModel::default();

    for (id, name) in output.regclasses.iter().enumerate() {
        model.classes.insert(name.clone(), RegisterClass { id, name: name.clone() });
    }

    let mut name_to_index: IndexMap<String, usize> = IndexMap::new();
    for (id, reg) in output.registers.iter().enumerate() {
        name_to_index.insert(reg.name.clone(), id);
    }

    for (id, reg_decl) in output.registers.iter().enumerate() {
        let class = match &reg_decl.class {
            Some(class_name) => {
                model.classes.get(class_name).map(|c| c.id).ok_or_else(|| {
                    ModelError::new(format!("register '{}' names undeclared class '{}'", reg_decl.name, class_name))
                })?
            }
            None => return Err(ModelError::new(format!("register '{}' has no class", reg_decl.name))),
        };
        let parent = match &reg_decl.parent {
            Some(parent_name) => Some(*name_to_index.get(parent_name).ok_or_else(|| {
                ModelError::new(format!("register '{}' names undeclared parent '{}'", reg_decl.name, parent_name))
            })?),
            None => None,
        };
        model.registers.insert(
            reg_decl.name.clone(),
            Register { id, name: reg_decl.name.clone(), class, width_bits: reg_decl.width_bits, parent, child: None },
        );
    }

    let child_links: Vec<(usize, usize)> =
        model.registers.values().filter_map(|r| r.parent.map(|p| (p, r.id))).collect();
    for (parent_id, child_id) in child_links {
        let (parent_name, already_has_child) = {
            let parent = model.registers.values().find(|r| r.id == parent_id).expect("parent index is valid");
            (parent.name.clone(), parent.child.is_some())
        };
        if already_has_child {
            return Err(ModelError::new(format!("register '{parent_name}' has more than one child register")));
        }
        if let Some(parent) = model.registers.values_mut().find(|r| r.id == parent_id) {
            parent.child = Some(child_id);
        }
    }

    for data_decl in &output.data {
        let fields = data_decl
            .fields
            .iter()
            .map(|f| DataField { name: f.name.clone(), width_bits: f.width_bits, default: f.default })
            .collect();
        model.data.insert(data_decl.name.clone(), DataEntry { name: data_decl.name.clone(), fields });
    }

    model.extensions = output.extensions.clone();

    for (id, instr_decl) in output.instrs.iter().enumerate() {
        for op in &instr_decl.operands {
            if let OperandKind::RegClass { class, .. } = op {
                if !model.classes.contains_key(class) {
                    return Err(ModelError::new(format!(
                        "instruction '{}' operand names undeclared class '{}'",
                        instr_decl.name, class
                    )));
                }
            }
        }

        let find_operand = |binding: &str| -> Option<usize> {
            instr_decl.operands.iter().position(|op| op.binding_name() == binding)
        };

        let result_operand_ref = match &instr_decl.result {
            Some(binding) => Some(find_operand(binding).ok_or_else(|| {
                ModelError::new(format!("instruction '{}' result '{}' is not a declared operand", instr_decl.name, binding))
            })?),
            None => None,
        };

        if instr_decl.clobbers.len() > 6 {
            return Err(ModelError::new(format!(
                "instruction '{}' declares {} clobbers, at most 6 allowed",
                instr_decl.name,
                instr_decl.clobbers.len()
            )));
        }
        let mut clobbers = SmallVec::with_capacity(instr_decl.clobbers.len());
        for binding in &instr_decl.clobbers {
            let idx = find_operand(binding).ok_or_else(|| {
                ModelError::new(format!("instruction '{}' clobber '{}' is not a declared operand", instr_decl.name, binding))
            })?;
            clobbers.push(idx);
        }

        let format = match &instr_decl.format {
            Some(spec) => {
                let mut formatees = Vec::with_capacity(spec.formatees.len());
                for formatee in &spec.formatees {
                    let idx = find_operand(&formatee.binding_name).ok_or_else(|| {
                        ModelError::new(format!(
                            "instruction '{}' format references undeclared operand '{}'",
                            instr_decl.name, formatee.binding_name
                        ))
                    })?;
                    formatees.push(ResolvedFormatee { operand_index: idx, accessor: formatee.accessor.clone() });
                }
                Some(ResolvedFormat { fmt_string: spec.fmt_string.clone(), formatees })
            }
            None => None,
        };

        model.instrs.insert(
            instr_decl.name.clone(),
            Instruction { id, name: instr_decl.name.clone(), operands: instr_decl.operands.clone(), result_operand_ref, clobbers, format },
        );
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_tdl_source_round_trips_through_the_model() {
        let src = r#"
target = "x86_64"
endian = little
regclass [ GPR64 ]
register RAX { width = 64 class = GPR64 }
instr nop() { format = "nop" () }
"#;
        let (output, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none());
        let model = build(&output).unwrap();

        let rax = model.register("RAX").unwrap();
        assert_eq!(rax.width_bits, 64);
        assert_eq!(model.classes.get("GPR64").unwrap().id, rax.class);

        let nop = model.instruction("nop").unwrap();
        assert!(nop.operands.is_empty());
        assert!(nop.clobbers.is_empty());
        let fmt = nop.format.as_ref().unwrap();
        assert_eq!(fmt.fmt_string, "nop");
        assert!(fmt.formatees.is_empty());
    }

    #[test]
    fn clobber_list_over_six_is_rejected() {
        let src = r#"
regclass [ GPR ]
instr many(GPR a, GPR b, GPR c, GPR d, GPR e, GPR f, GPR g) {
    clobber = [ a b c d e f g ]
}
"#;
        let (output, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none());
        assert!(build(&output).is_err());
    }

    #[test]
    fn dangling_result_reference_is_rejected() {
        let src = r#"
regclass [ GPR ]
instr bad(GPR a) {
    result = nonexistent
}
"#;
        let (output, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none());
        assert!(build(&output).is_err());
    }

    #[test]
    fn register_aliasing_chain_links_parent_and_child() {
        let src = r#"
regclass [ GPR64 GPR32 ]
register RAX { width = 64 class = GPR64 }
register EAX { width = 32 class = GPR32 parent RAX }
"#;
        let (output, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none());
        let model = build(&output).unwrap();
        let rax = model.register("RAX").unwrap();
        let eax = model.register("EAX").unwrap();
        assert_eq!(eax.parent, Some(rax.id));
        assert_eq!(rax.child, Some(eax.id));
    }
}
