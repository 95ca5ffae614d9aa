use std::collections::{BTreeMap, HashSet};

use basalt_core::Label;

use crate::model::Module;

#[derive(Debug, thiserror::Error)]
pub enum ModuleGraphError {
    #[error("dependency cycle detected at module {label}")]
    Cycle { label: Label },
}

enum Frame {
    Visit(Label),
    Finish(Label),
}

/// Apply `transformer` to every module exactly once, dependencies first.
///
/// When a module is transformed, all of its in-set dependencies have
/// already been transformed and are available in the map passed to the
/// transformer. Dependencies pointing outside the module set (libraries,
/// unknown labels) are leaves. The output preserves the input order.
///
/// A dependency cycle raises [`ModuleGraphError::Cycle`] instead of
/// hanging (three-color depth-first search; an edge back into a node on
/// the active path is a cycle). A transformer returning a module under a
/// different label is a programming defect and panics immediately.
pub fn transform_bottom_up<F>(
    modules: Vec<Module>,
    mut transformer: F,
) -> Result<Vec<Module>, ModuleGraphError>
where
    F: FnMut(Module, &BTreeMap<Label, Module>) -> Module,
{
    let order: Vec<Label> = modules.iter().map(|module| module.label.clone()).collect();
    let mut pending: BTreeMap<Label, Module> = modules
        .into_iter()
        .map(|module| (module.label.clone(), module))
        .collect();
    let mut done: BTreeMap<Label, Module> = BTreeMap::new();

    for root in &order {
        visit(root, &mut pending, &mut done, &mut transformer)?;
    }

    Ok(order
        .iter()
        .map(|label| {
            done.remove(label)
                .expect("every module in the input order was transformed")
        })
        .collect())
}

fn visit<F>(
    root: &Label,
    pending: &mut BTreeMap<Label, Module>,
    done: &mut BTreeMap<Label, Module>,
    transformer: &mut F,
) -> Result<(), ModuleGraphError>
where
    F: FnMut(Module, &BTreeMap<Label, Module>) -> Module,
{
    // Grey = on the active DFS path (has a pending Finish frame). Black is
    // represented by membership in `done`.
    let mut grey: HashSet<Label> = HashSet::new();
    let mut stack: Vec<Frame> = vec![Frame::Visit(root.clone())];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Visit(label) => {
                if done.contains_key(&label) {
                    continue;
                }
                if grey.contains(&label) {
                    return Err(ModuleGraphError::Cycle { label });
                }
                let Some(module) = pending.get(&label) else {
                    // Out-of-set dependency: a library or unknown label.
                    continue;
                };

                grey.insert(label.clone());
                stack.push(Frame::Finish(label.clone()));
                for dependency in module.direct_dependencies.iter().rev() {
                    if done.contains_key(dependency) {
                        continue;
                    }
                    if grey.contains(dependency) {
                        return Err(ModuleGraphError::Cycle {
                            label: dependency.clone(),
                        });
                    }
                    stack.push(Frame::Visit(dependency.clone()));
                }
            }
            Frame::Finish(label) => {
                let module = pending
                    .remove(&label)
                    .expect("finished module must still be pending");
                let transformed = transformer(module, done);
                if transformed.label != label {
                    panic!(
                        "module graph transformer changed label {label} to {}",
                        transformed.label
                    );
                }
                grey.remove(&label);
                done.insert(label, transformed);
            }
        }
    }

    Ok(())
}
