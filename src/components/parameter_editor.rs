//! Method Parameter Editor
//!
//! Sub-form for the parameter list of a method. Rows are edited in place;
//! the owner compares the list against its baseline to decide dirtiness.

use leptos::prelude::*;

use crate::models::MethodParameter;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Type,
    Description,
    Example,
}

fn set_column(parameter: &mut MethodParameter, column: Column, value: String) {
    match column {
        Column::Name => parameter.name = value,
        Column::Type => parameter.parameter_type = value,
        Column::Description => parameter.description = Some(value).filter(|v| !v.is_empty()),
        Column::Example => parameter.example_value = Some(value).filter(|v| !v.is_empty()),
    }
}

fn column_value(parameter: &MethodParameter, column: Column) -> String {
    match column {
        Column::Name => parameter.name.clone(),
        Column::Type => parameter.parameter_type.clone(),
        Column::Description => parameter.description.clone().unwrap_or_default(),
        Column::Example => parameter.example_value.clone().unwrap_or_default(),
    }
}

/// Keep `index` equal to the row position
fn reindex(parameters: &mut [MethodParameter]) {
    for (i, p) in parameters.iter_mut().enumerate() {
        p.index = i as i32;
    }
}

#[component]
pub fn ParameterEditor(
    parameters: RwSignal<Vec<MethodParameter>>,
    #[prop(into)] on_change: Callback<()>,
) -> impl IntoView {
    let add_row = move |_| {
        parameters.update(|list| {
            list.push(MethodParameter::default());
            reindex(list);
        });
        on_change.run(());
    };

    let cell = move |row: usize, column: Column, placeholder: &'static str| {
        view! {
            <input
                type="text"
                placeholder=placeholder
                prop:value=move || parameters.with(|l| l.get(row).map(|p| column_value(p, column)).unwrap_or_default())
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    parameters.update(|l| {
                        if let Some(p) = l.get_mut(row) {
                            set_column(p, column, value);
                        }
                    });
                    on_change.run(());
                }
            />
        }
    };

    view! {
        <div class="parameter-editor">
            <table>
                <thead>
                    <tr>
                        <th>"#"</th>
                        <th>"Name"</th>
                        <th>"Type"</th>
                        <th>"Description"</th>
                        <th>"Example Value"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || 0..parameters.with(Vec::len)
                        key=|row| *row
                        children=move |row| {
                            view! {
                                <tr>
                                    <td class="parameter-index">{row}</td>
                                    <td>{cell(row, Column::Name, "name")}</td>
                                    <td>{cell(row, Column::Type, "type")}</td>
                                    <td>{cell(row, Column::Description, "description")}</td>
                                    <td>{cell(row, Column::Example, "example")}</td>
                                    <td>
                                        <button
                                            class="remove-parameter-btn"
                                            on:click=move |_| {
                                                parameters.update(|l| {
                                                    if row < l.len() {
                                                        l.remove(row);
                                                        reindex(l);
                                                    }
                                                });
                                                on_change.run(());
                                            }
                                        >
                                            "×"
                                        </button>
                                    </td>
                                </tr>
                            }
                        }
                    />
                </tbody>
            </table>
            <button class="add-parameter-btn" on:click=add_row>"Add parameter"</button>
        </div>
    }
}
