use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::InputEvent;
use yew::prelude::*;

mod aggregate;
mod api;
mod chart;
mod models;

use aggregate::{
    category_alerts, format_usd, remaining, total_of, trailing_months, trend_for, usage_percent,
    usage_status, MONTH_LABELS,
};
use api::{surface, Api, ApiError};
use chart::{ChartInput, ChartKind, ChartRegistry, Series, PALETTE};
use models::{BudgetConfig, ExpenseRecord, IncomeRecord, SpendingSummary, CATEGORIES};

#[derive(Clone, Copy, PartialEq)]
enum Page {
    Dashboard,
    Income,
    Budgets,
    Reports,
}

/// Expense form state machine: a submission either creates a new record or
/// updates the record whose id was captured by an explicit Edit action.
#[derive(Clone, Copy, PartialEq)]
enum FormMode {
    Creating,
    Editing(i64),
}

fn today_string() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:04}-{:02}-{:02}",
        now.get_full_year() as i32,
        now.get_month() as u32 + 1,
        now.get_date() as u32
    )
}

fn current_year() -> i32 {
    js_sys::Date::new_0().get_full_year() as i32
}

fn current_month() -> u32 {
    js_sys::Date::new_0().get_month() as u32 + 1
}

/// Bumps the shared refresh counter and returns the new cycle number.
/// Completions compare against the counter before writing state, so a refresh
/// overtaken by a newer one is discarded instead of winning the race.
fn bump(seq: &Rc<RefCell<u64>>) -> u64 {
    let mut s = seq.borrow_mut();
    *s += 1;
    *s
}

fn is_current(seq: &Rc<RefCell<u64>>, cycle: u64) -> bool {
    *seq.borrow() == cycle
}

/// Numeric input prefill without trailing ".0" noise.
fn format_limit(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Properties, PartialEq)]
struct LayoutProps {
    children: Children,
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Layout)]
fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="flex h-screen bg-slate-100">
            <Sidebar active_page={props.active_page} on_select={props.on_select.clone()} />
            <main class="flex-1 overflow-y-auto">
                { for props.children.iter() }
            </main>
        </div>
    }
}

struct NavItem {
    label: &'static str,
    page: Page,
    icon: fn() -> Html,
}

#[derive(Properties, PartialEq)]
struct SidebarProps {
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Sidebar)]
fn sidebar(props: &SidebarProps) -> Html {
    let api = use_context::<Api>().unwrap_or_default();
    let nav_items = vec![
        NavItem {
            label: "Dashboard",
            page: Page::Dashboard,
            icon: icon_layout_grid,
        },
        NavItem {
            label: "Income",
            page: Page::Income,
            icon: icon_trending_up,
        },
        NavItem {
            label: "Budgets",
            page: Page::Budgets,
            icon: icon_wallet,
        },
        NavItem {
            label: "Reports",
            page: Page::Reports,
            icon: icon_bar_chart,
        },
    ];

    let on_logout = Callback::from(move |_| {
        api.session.logout();
    });

    html! {
        <div class="w-[220px] h-screen bg-slate-800 text-slate-200 p-4 flex flex-col">
            <div class="flex items-center gap-3 px-2 mb-8">
                <span class="text-2xl font-black tracking-tight">{"SpendWise"}</span>
            </div>
            <nav class="flex-1 space-y-2">
                { for nav_items.iter().map(|item| {
                    let is_active = item.page == props.active_page;
                    let class_name = if is_active {
                        "flex items-center gap-3 px-4 py-3 rounded-xl text-sm font-medium bg-slate-600 text-white w-full"
                    } else {
                        "flex items-center gap-3 px-4 py-3 rounded-xl text-sm font-medium text-slate-300 hover:bg-white/5 hover:text-white w-full"
                    };
                    let on_select = props.on_select.clone();
                    let page = item.page;

                    html! {
                        <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(page))}>
                            <span class="shrink-0">{ (item.icon)() }</span>
                            <span class="truncate text-left">{ item.label }</span>
                        </button>
                    }
                }) }
            </nav>
            <div class="mt-auto pt-4">
                <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-xl hover:bg-white/10 text-sm font-medium text-slate-300">
                    { icon_log_out() }
                    <span>{"Log Out"}</span>
                </button>
            </div>
        </div>
    }
}

fn page_shell(title: &'static str, children: Html) -> Html {
    html! {
        <div class="p-6 max-w-6xl mx-auto">
            <div class="pb-4 border-b border-slate-200">
                <h1 class="text-2xl font-bold text-slate-800">{ title }</h1>
            </div>
            <div class="pt-5 space-y-6">
                { children }
            </div>
        </div>
    }
}

/// The state handles a dashboard refresh cycle writes back into.
#[derive(Clone)]
struct DashboardState {
    expenses: UseStateHandle<Vec<ExpenseRecord>>,
    summary: UseStateHandle<SpendingSummary>,
    budget: UseStateHandle<BudgetConfig>,
    tips: UseStateHandle<Vec<String>>,
    loading: UseStateHandle<bool>,
}

/// The sequential chain behind every dashboard load and mutation: fetch the
/// expense list, then the spending summary, then the budget config, then
/// redraw the breakdown chart. Stale cycles are dropped, not merged.
fn refresh_dashboard(
    api: Api,
    seq: Rc<RefCell<u64>>,
    charts: Rc<RefCell<ChartRegistry>>,
    state: DashboardState,
) {
    let cycle = bump(&seq);
    spawn_local(async move {
        let result = async {
            let mut list = api.expenses().await?;
            list.sort_by(|a, b| b.date.cmp(&a.date));
            let summary = api.summary(None, None).await?;
            let budget = api.budgets().await?;
            Ok::<_, ApiError>((list, summary, budget))
        }
        .await;

        if !is_current(&seq, cycle) {
            gloo_console::warn!(format!("discarding stale dashboard refresh #{}", cycle));
            return;
        }

        match result {
            Ok((list, summary, budget)) => {
                let labels: Vec<String> = summary.per_category_totals.keys().cloned().collect();
                let values: Vec<f64> = summary.per_category_totals.values().copied().collect();
                charts.borrow_mut().render(
                    ChartKind::Bar,
                    "expense-chart",
                    &ChartInput::single("Spent", labels, values),
                );
                state.expenses.set(list);
                state.summary.set(summary);
                state.budget.set(budget);
            }
            Err(ApiError::AuthRequired) => return,
            Err(err) => surface("Could not load the dashboard", &err),
        }

        // Tips are decoration; a failure just leaves the card empty.
        match api.tips().await {
            Ok(tips) => {
                if is_current(&seq, cycle) {
                    state.tips.set(tips);
                }
            }
            Err(err) => gloo_console::warn!(format!("saving tips unavailable: {}", err)),
        }
        state.loading.set(false);
    });
}

#[function_component(DashboardPage)]
fn dashboard_page() -> Html {
    let api = use_context::<Api>().unwrap_or_default();
    let expenses = use_state(Vec::<ExpenseRecord>::new);
    let summary = use_state(SpendingSummary::default);
    let budget = use_state(BudgetConfig::default);
    let tips = use_state(Vec::<String>::new);
    let loading = use_state(|| true);
    let charts = use_mut_ref(ChartRegistry::default);
    let refresh_seq = use_mut_ref(|| 0u64);

    let form_mode = use_state(|| FormMode::Creating);
    let form_date = use_state(today_string);
    let form_amount = use_state(String::new);
    let form_category = use_state(|| CATEGORIES[0].to_string());
    let form_description = use_state(String::new);
    let form_error = use_state(|| None::<String>);
    let saving = use_state(|| false);

    let state = DashboardState {
        expenses: expenses.clone(),
        summary: summary.clone(),
        budget: budget.clone(),
        tips: tips.clone(),
        loading: loading.clone(),
    };

    {
        let api = api.clone();
        let seq = refresh_seq.clone();
        let charts = charts.clone();
        let state = state.clone();
        use_effect_with_deps(
            move |_| {
                refresh_dashboard(api, seq, charts, state);
                || ()
            },
            (),
        );
    }

    let reset_form = {
        let form_mode = form_mode.clone();
        let form_date = form_date.clone();
        let form_amount = form_amount.clone();
        let form_category = form_category.clone();
        let form_description = form_description.clone();
        let form_error = form_error.clone();
        Callback::from(move |_: ()| {
            form_mode.set(FormMode::Creating);
            form_date.set(today_string());
            form_amount.set(String::new());
            form_category.set(CATEGORIES[0].to_string());
            form_description.set(String::new());
            form_error.set(None);
        })
    };

    let on_submit = {
        let api = api.clone();
        let seq = refresh_seq.clone();
        let charts = charts.clone();
        let state = state.clone();
        let form_mode = form_mode.clone();
        let form_date = form_date.clone();
        let form_amount = form_amount.clone();
        let form_category = form_category.clone();
        let form_description = form_description.clone();
        let form_error = form_error.clone();
        let saving = saving.clone();
        let reset_form = reset_form.clone();

        Callback::from(move |_: MouseEvent| {
            let date_val = form_date.trim().to_string();
            let amount_val = form_amount.trim().to_string();
            if date_val.is_empty() || amount_val.is_empty() {
                form_error.set(Some("Please fill in amount and date.".to_string()));
                return;
            }
            let amount = match amount_val.parse::<f64>() {
                Ok(a) => a,
                Err(_) => {
                    form_error.set(Some("Amount must be a number.".to_string()));
                    return;
                }
            };
            let description = {
                let d = form_description.trim().to_string();
                (!d.is_empty()).then_some(d)
            };
            let record = ExpenseRecord {
                id: None,
                amount,
                category: (*form_category).clone(),
                date: date_val,
                description,
            };

            form_error.set(None);
            saving.set(true);

            let api = api.clone();
            let seq = seq.clone();
            let charts = charts.clone();
            let state = state.clone();
            let mode = *form_mode;
            let saving = saving.clone();
            let reset_form = reset_form.clone();
            spawn_local(async move {
                let result = match mode {
                    FormMode::Creating => api.create_expense(&record).await.map(|_| ()),
                    FormMode::Editing(id) => api.update_expense(id, &record).await.map(|_| ()),
                };
                match result {
                    Ok(()) => {
                        reset_form.emit(());
                        refresh_dashboard(api.clone(), seq, charts, state);
                    }
                    Err(ApiError::AuthRequired) => {}
                    Err(err) => surface("Could not save the expense", &err),
                }
                saving.set(false);
            });
        })
    };

    let on_edit = {
        let form_mode = form_mode.clone();
        let form_date = form_date.clone();
        let form_amount = form_amount.clone();
        let form_category = form_category.clone();
        let form_description = form_description.clone();
        let form_error = form_error.clone();
        Callback::from(move |record: ExpenseRecord| {
            if let Some(id) = record.id {
                form_mode.set(FormMode::Editing(id));
                form_date.set(record.date.clone());
                form_amount.set(format_limit(record.amount));
                form_category.set(record.category.clone());
                form_description.set(record.description.clone().unwrap_or_default());
                form_error.set(None);
            }
        })
    };

    let on_cancel_edit = {
        let reset_form = reset_form.clone();
        Callback::from(move |_: MouseEvent| reset_form.emit(()))
    };

    let on_delete = {
        let api = api.clone();
        let seq = refresh_seq.clone();
        let charts = charts.clone();
        let state = state.clone();
        Callback::from(move |id: i64| {
            if !gloo_dialogs::confirm("Delete this expense?") {
                return;
            }
            let api = api.clone();
            let seq = seq.clone();
            let charts = charts.clone();
            let state = state.clone();
            spawn_local(async move {
                match api.delete_expense(id).await {
                    Ok(()) => refresh_dashboard(api.clone(), seq, charts, state),
                    Err(ApiError::AuthRequired) => {}
                    Err(err) => surface("Could not delete the expense", &err),
                }
            });
        })
    };

    let remaining_amount = remaining(&budget, &summary);
    let alerts = category_alerts(&summary, &budget.category_limits);
    let statuses: Vec<(&str, f64, f64)> = CATEGORIES
        .iter()
        .map(|cat| {
            let spent = summary.per_category_totals.get(*cat).copied().unwrap_or(0.0);
            let limit = budget.category_limits.get(*cat).copied().unwrap_or(0.0);
            (*cat, spent, limit)
        })
        .collect();
    let editing = matches!(*form_mode, FormMode::Editing(_));

    page_shell(
        "Dashboard",
        html! {
            <>
                <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <p class="text-sm text-slate-500 mb-2">{"Total Spent"}</p>
                        <h3 class="text-2xl font-bold text-slate-800">{ format_usd(summary.total_spent) }</h3>
                    </div>
                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <p class="text-sm text-slate-500 mb-2">{"Monthly Limit"}</p>
                        <h3 class="text-2xl font-bold text-slate-800">{ format_usd(budget.monthly_limit) }</h3>
                    </div>
                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <p class="text-sm text-slate-500 mb-2">{"Remaining Budget"}</p>
                        <h3 class={if remaining_amount < 0.0 { "text-2xl font-bold text-red-600" } else { "text-2xl font-bold text-slate-800" }}>
                            { format_usd(remaining_amount) }
                        </h3>
                    </div>
                </div>

                { if summary.budget_exceeded {
                    html! {
                        <div class="bg-red-50 border border-red-200 text-red-700 rounded-xl p-4 text-sm font-bold">
                            {"You have exceeded your monthly budget!"}
                        </div>
                    }
                } else { html!{} } }

                { if !alerts.is_empty() {
                    html! {
                        <div class="bg-orange-50 border border-orange-200 rounded-xl p-4 space-y-1">
                            { for alerts.iter().map(|alert| html! {
                                <p class="text-sm text-orange-700 font-semibold">{ alert.message.clone() }</p>
                            }) }
                        </div>
                    }
                } else { html!{} } }

                <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <h3 class="font-bold text-slate-800 text-lg mb-4">{"Budget Status"}</h3>
                        <div class="space-y-2">
                            { for statuses.iter().map(|(category, spent, limit)| {
                                let tier = usage_status(*spent, *limit);
                                let percent = usage_percent(*spent, *limit);
                                html! {
                                    <div class="flex items-center justify-between text-sm border-b border-slate-100 pb-2">
                                        <span class="font-semibold text-slate-700">{ *category }</span>
                                        <span class="text-slate-500">
                                            { format!("{} / {} ({:.1}%)", format_usd(*spent), format_usd(*limit), percent) }
                                        </span>
                                        <span class={tier.css_class()}>{ tier.label() }</span>
                                    </div>
                                }
                            }) }
                        </div>
                    </div>

                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <h3 class="font-bold text-slate-800 text-lg mb-4">{"Expense Breakdown"}</h3>
                        { if !*loading && summary.per_category_totals.is_empty() {
                            html! { <p class="text-sm text-slate-500">{"No expenses recorded this month."}</p> }
                        } else { html!{} } }
                        <div class="h-64">
                            <canvas id="expense-chart"></canvas>
                        </div>
                    </div>
                </div>

                { if !tips.is_empty() {
                    html! {
                        <div class="bg-white rounded-xl p-6 border border-slate-200">
                            <h3 class="font-bold text-slate-800 text-lg mb-3">{"Saving Tips"}</h3>
                            <ul class="space-y-1 list-disc list-inside">
                                { for tips.iter().map(|tip| html! {
                                    <li class="text-sm text-slate-600">{ tip.clone() }</li>
                                }) }
                            </ul>
                        </div>
                    }
                } else { html!{} } }

                <div class="bg-white rounded-xl p-6 border border-slate-200">
                    <div class="flex items-center justify-between mb-4">
                        <h3 class="font-bold text-slate-800 text-lg">
                            { if editing { "Edit Expense" } else { "Add Expense" } }
                        </h3>
                        { if editing {
                            html! {
                                <button onclick={on_cancel_edit} class="text-sm font-bold text-slate-500 hover:text-slate-700">
                                    {"Cancel"}
                                </button>
                            }
                        } else { html!{} } }
                    </div>
                    <div class="grid grid-cols-1 md:grid-cols-4 gap-3">
                        <input type="date" value={(*form_date).clone()} oninput={{
                            let form_date = form_date.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                form_date.set(input.value());
                            })
                        }} class="p-2 border rounded" />
                        <input type="number" step="0.01" placeholder="Amount" value={(*form_amount).clone()} oninput={{
                            let form_amount = form_amount.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                form_amount.set(input.value());
                            })
                        }} class="p-2 border rounded" />
                        <select onchange={{
                            let form_category = form_category.clone();
                            Callback::from(move |e: Event| {
                                let input: web_sys::HtmlSelectElement = e.target_unchecked_into();
                                form_category.set(input.value());
                            })
                        }} class="p-2 border rounded">
                            { for CATEGORIES.iter().map(|cat| html! {
                                <option value={*cat} selected={*cat == *form_category}>{ *cat }</option>
                            }) }
                        </select>
                        <div class="flex gap-2">
                            <input placeholder="Description" value={(*form_description).clone()} oninput={{
                                let form_description = form_description.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    form_description.set(input.value());
                                })
                            }} class="p-2 border rounded flex-1" />
                            <button onclick={on_submit} disabled={*saving} class="bg-slate-800 text-white px-4 rounded font-bold">
                                { if *saving { "Saving..." } else if editing { "Update" } else { "Save" } }
                            </button>
                        </div>
                    </div>
                    { if let Some(msg) = &*form_error {
                        html! { <p class="text-sm text-red-500 mt-3">{ msg.clone() }</p> }
                    } else { html!{} } }
                </div>

                <div class="bg-white rounded-xl border border-slate-200 overflow-hidden">
                    <div class="p-5 border-b border-slate-200">
                        <h3 class="font-bold text-slate-800 text-lg">{"Expenses"}</h3>
                    </div>
                    <div class="overflow-x-auto">
                        <table class="w-full text-left border-collapse">
                            <thead>
                                <tr class="bg-slate-50 text-slate-500 text-xs uppercase tracking-widest">
                                    <th class="px-6 py-3 font-bold">{"Date"}</th>
                                    <th class="px-6 py-3 font-bold">{"Category"}</th>
                                    <th class="px-6 py-3 font-bold">{"Description"}</th>
                                    <th class="px-6 py-3 font-bold text-right">{"Amount"}</th>
                                    <th class="px-6 py-3 font-bold">{"Actions"}</th>
                                </tr>
                            </thead>
                            <tbody class="divide-y divide-slate-100">
                                { if *loading {
                                    html! { <tr><td colspan="5" class="px-6 py-6 text-center text-slate-500">{"Loading..."}</td></tr> }
                                } else if expenses.is_empty() {
                                    html! { <tr><td colspan="5" class="px-6 py-6 text-center text-slate-500">{"No expenses yet."}</td></tr> }
                                } else {
                                    html! {
                                        <>
                                            { for expenses.iter().map(|record| {
                                                let on_edit = on_edit.clone();
                                                let on_delete = on_delete.clone();
                                                let edit_record = record.clone();
                                                let delete_id = record.id;
                                                html! {
                                                    <tr class="text-sm hover:bg-slate-50">
                                                        <td class="px-6 py-3 text-slate-500">{ record.date.clone() }</td>
                                                        <td class="px-6 py-3">
                                                            <span class="bg-slate-100 text-slate-700 px-3 py-1 rounded-full text-xs font-bold">{ record.category.clone() }</span>
                                                        </td>
                                                        <td class="px-6 py-3 text-slate-700">{ record.description.clone().unwrap_or_default() }</td>
                                                        <td class="px-6 py-3 text-right font-semibold text-slate-800">{ format_usd(record.amount) }</td>
                                                        <td class="px-6 py-3">
                                                            <div class="flex gap-2">
                                                                <button class="text-xs font-bold text-slate-600 hover:underline" onclick={Callback::from(move |_| on_edit.emit(edit_record.clone()))}>{"Edit"}</button>
                                                                { if let Some(id) = delete_id {
                                                                    html! {
                                                                        <button class="text-xs font-bold text-red-600 hover:underline" onclick={Callback::from(move |_| on_delete.emit(id))}>{"Delete"}</button>
                                                                    }
                                                                } else { html!{} } }
                                                            </div>
                                                        </td>
                                                    </tr>
                                                }
                                            }) }
                                        </>
                                    }
                                }}
                            </tbody>
                        </table>
                    </div>
                </div>
            </>
        },
    )
}

#[function_component(IncomePage)]
fn income_page() -> Html {
    let api = use_context::<Api>().unwrap_or_default();
    let form_date = use_state(today_string);
    let form_amount = use_state(String::new);
    let form_description = use_state(String::new);
    let form_error = use_state(|| None::<String>);
    let form_success = use_state(|| None::<String>);
    let saving = use_state(|| false);

    let on_add = {
        let api = api.clone();
        let form_date = form_date.clone();
        let form_amount = form_amount.clone();
        let form_description = form_description.clone();
        let form_error = form_error.clone();
        let form_success = form_success.clone();
        let saving = saving.clone();
        Callback::from(move |_: MouseEvent| {
            let date_val = form_date.trim().to_string();
            let amount_val = form_amount.trim().to_string();
            if date_val.is_empty() || amount_val.is_empty() {
                form_error.set(Some("Please fill in amount and date.".to_string()));
                return;
            }
            let amount = match amount_val.parse::<f64>() {
                Ok(a) => a,
                Err(_) => {
                    form_error.set(Some("Amount must be a number.".to_string()));
                    return;
                }
            };
            let record = IncomeRecord {
                amount,
                date: date_val,
                description: {
                    let d = form_description.trim().to_string();
                    (!d.is_empty()).then_some(d)
                },
            };

            form_error.set(None);
            form_success.set(None);
            saving.set(true);

            let api = api.clone();
            let form_amount = form_amount.clone();
            let form_description = form_description.clone();
            let form_error = form_error.clone();
            let form_success = form_success.clone();
            let saving = saving.clone();
            spawn_local(async move {
                match api.create_income(&record).await {
                    Ok(_) => {
                        form_amount.set(String::new());
                        form_description.set(String::new());
                        form_success.set(Some("Income recorded.".to_string()));
                    }
                    Err(ApiError::AuthRequired) => {}
                    Err(err) => {
                        surface("Could not record the income", &err);
                        form_error.set(Some(err.to_string()));
                    }
                }
                saving.set(false);
            });
        })
    };

    let on_clear = {
        let form_date = form_date.clone();
        let form_amount = form_amount.clone();
        let form_description = form_description.clone();
        Callback::from(move |_: MouseEvent| {
            form_date.set(today_string());
            form_amount.set(String::new());
            form_description.set(String::new());
        })
    };

    page_shell(
        "Income",
        html! {
            <div class="bg-white p-6 rounded-xl border border-slate-200 max-w-2xl">
                <h4 class="font-bold text-slate-800 mb-4">{"Record Income"}</h4>
                <div class="grid grid-cols-1 md:grid-cols-3 gap-3 mb-4">
                    <div class="space-y-1">
                        <label class="text-xs font-bold text-slate-500">{"Date"}</label>
                        <input type="date" value={(*form_date).clone()} oninput={{
                            let form_date = form_date.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                form_date.set(input.value());
                            })
                        }} class="w-full p-2 border rounded" />
                    </div>
                    <div class="space-y-1">
                        <label class="text-xs font-bold text-slate-500">{"Amount"}</label>
                        <input type="number" step="0.01" placeholder="0.00" value={(*form_amount).clone()} oninput={{
                            let form_amount = form_amount.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                form_amount.set(input.value());
                            })
                        }} class="w-full p-2 border rounded" />
                    </div>
                    <div class="space-y-1">
                        <label class="text-xs font-bold text-slate-500">{"Description"}</label>
                        <input type="text" placeholder="Income source" value={(*form_description).clone()} oninput={{
                            let form_description = form_description.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                form_description.set(input.value());
                            })
                        }} class="w-full p-2 border rounded" />
                    </div>
                </div>
                <div class="flex gap-3">
                    <button onclick={on_add} disabled={*saving} class="flex-1 bg-slate-800 text-white py-2 rounded font-bold text-sm">
                        { if *saving { "Saving..." } else { "Add Income" } }
                    </button>
                    <button onclick={on_clear} class="flex-1 bg-slate-200 text-slate-700 py-2 rounded font-bold text-sm">{"Clear"}</button>
                </div>
                { if let Some(msg) = &*form_error {
                    html! { <p class="text-sm text-red-500 mt-3">{ msg.clone() }</p> }
                } else if let Some(msg) = &*form_success {
                    html! { <p class="text-sm text-green-600 mt-3">{ msg.clone() }</p> }
                } else { html!{} } }
            </div>
        },
    )
}

#[derive(Clone)]
struct BudgetsState {
    budget: UseStateHandle<BudgetConfig>,
    summary: UseStateHandle<SpendingSummary>,
    monthly_input: UseStateHandle<String>,
    limit_inputs: UseStateHandle<BTreeMap<String, String>>,
    loading: UseStateHandle<bool>,
}

fn refresh_budgets(api: Api, seq: Rc<RefCell<u64>>, state: BudgetsState) {
    let cycle = bump(&seq);
    spawn_local(async move {
        let result = async {
            let config = api.budgets().await?;
            let summary = api.summary(None, None).await?;
            Ok::<_, ApiError>((config, summary))
        }
        .await;

        if !is_current(&seq, cycle) {
            gloo_console::warn!(format!("discarding stale budget refresh #{}", cycle));
            return;
        }

        match result {
            Ok((config, summary)) => {
                state.monthly_input.set(format_limit(config.monthly_limit));
                let mut drafts = BTreeMap::new();
                for cat in CATEGORIES {
                    if let Some(value) = config.category_limits.get(cat) {
                        drafts.insert(cat.to_string(), format_limit(*value));
                    }
                }
                state.limit_inputs.set(drafts);
                state.budget.set(config);
                state.summary.set(summary);
            }
            Err(ApiError::AuthRequired) => return,
            Err(err) => surface("Could not load budgets", &err),
        }
        state.loading.set(false);
    });
}

#[function_component(BudgetsPage)]
fn budgets_page() -> Html {
    let api = use_context::<Api>().unwrap_or_default();
    let budget = use_state(BudgetConfig::default);
    let summary = use_state(SpendingSummary::default);
    let monthly_input = use_state(String::new);
    let limit_inputs = use_state(BTreeMap::<String, String>::new);
    let loading = use_state(|| true);
    let refresh_seq = use_mut_ref(|| 0u64);
    let form_error = use_state(|| None::<String>);

    let state = BudgetsState {
        budget: budget.clone(),
        summary: summary.clone(),
        monthly_input: monthly_input.clone(),
        limit_inputs: limit_inputs.clone(),
        loading: loading.clone(),
    };

    {
        let api = api.clone();
        let seq = refresh_seq.clone();
        let state = state.clone();
        use_effect_with_deps(
            move |_| {
                refresh_budgets(api, seq, state);
                || ()
            },
            (),
        );
    }

    let on_save_monthly = {
        let api = api.clone();
        let seq = refresh_seq.clone();
        let state = state.clone();
        let monthly_input = monthly_input.clone();
        let form_error = form_error.clone();
        Callback::from(move |_: MouseEvent| {
            let limit = match monthly_input.trim().parse::<f64>() {
                Ok(v) if v >= 0.0 => v,
                _ => {
                    form_error.set(Some("Monthly limit must be a non-negative number.".to_string()));
                    return;
                }
            };
            form_error.set(None);

            let api = api.clone();
            let seq = seq.clone();
            let state = state.clone();
            spawn_local(async move {
                match api.save_monthly_limit(limit).await {
                    Ok(_) => refresh_budgets(api.clone(), seq, state),
                    Err(ApiError::AuthRequired) => {}
                    Err(err) => surface("Could not save the monthly limit", &err),
                }
            });
        })
    };

    let on_limit_input = {
        let limit_inputs = limit_inputs.clone();
        Callback::from(move |(category, value): (String, String)| {
            let mut next = (*limit_inputs).clone();
            next.insert(category, value);
            limit_inputs.set(next);
        })
    };

    let on_save_categories = {
        let api = api.clone();
        let seq = refresh_seq.clone();
        let state = state.clone();
        let limit_inputs = limit_inputs.clone();
        let form_error = form_error.clone();
        Callback::from(move |_: MouseEvent| {
            // The complete map replaces the stored one; zero or blank entries
            // drop the limit for that category, matching the backend contract.
            let mut limits = BTreeMap::new();
            for cat in CATEGORIES {
                let raw = limit_inputs.get(cat).cloned().unwrap_or_default();
                if raw.trim().is_empty() {
                    continue;
                }
                match raw.trim().parse::<f64>() {
                    Ok(value) if value > 0.0 => {
                        limits.insert(cat.to_string(), value);
                    }
                    Ok(_) => {}
                    Err(_) => {
                        form_error.set(Some(format!("{} limit must be a number.", cat)));
                        return;
                    }
                }
            }
            form_error.set(None);

            let api = api.clone();
            let seq = seq.clone();
            let state = state.clone();
            spawn_local(async move {
                match api.save_category_limits(&limits).await {
                    Ok(_) => refresh_budgets(api.clone(), seq, state),
                    Err(ApiError::AuthRequired) => {}
                    Err(err) => surface("Could not save the category limits", &err),
                }
            });
        })
    };

    page_shell(
        "Budgets",
        html! {
            <>
                <div class="bg-white p-6 rounded-xl border border-slate-200 max-w-2xl">
                    <h4 class="font-bold text-slate-800 mb-4">{"Monthly Limit"}</h4>
                    <div class="flex gap-3">
                        <input type="number" step="0.01" placeholder="0.00" value={(*monthly_input).clone()} oninput={{
                            let monthly_input = monthly_input.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                monthly_input.set(input.value());
                            })
                        }} class="flex-1 p-2 border rounded" />
                        <button onclick={on_save_monthly} class="bg-slate-800 text-white px-6 rounded font-bold text-sm">{"Save"}</button>
                    </div>
                </div>

                <div class="bg-white p-6 rounded-xl border border-slate-200 max-w-2xl">
                    <h4 class="font-bold text-slate-800 mb-4">{"Category Limits"}</h4>
                    { if *loading {
                        html! { <p class="text-sm text-slate-500">{"Loading..."}</p> }
                    } else {
                        html! {
                            <div class="space-y-3">
                                { for CATEGORIES.iter().map(|category| {
                                    let spent = summary.per_category_totals.get(*category).copied().unwrap_or(0.0);
                                    let limit = budget.category_limits.get(*category).copied().unwrap_or(0.0);
                                    let tier = usage_status(spent, limit);
                                    let value = limit_inputs.get(*category).cloned().unwrap_or_default();
                                    let on_limit_input = on_limit_input.clone();
                                    let cat = category.to_string();
                                    html! {
                                        <div class="grid grid-cols-3 gap-3 items-center">
                                            <label class="text-sm font-semibold text-slate-700">{ *category }</label>
                                            <input type="number" step="0.01" placeholder="No limit" value={value} oninput={
                                                Callback::from(move |e: InputEvent| {
                                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                                    on_limit_input.emit((cat.clone(), input.value()));
                                                })
                                            } class="p-2 border rounded" />
                                            <span class="text-sm text-slate-500">
                                                { format!("Spent {}, ", format_usd(spent)) }
                                                <span class={tier.css_class()}>{ tier.label() }</span>
                                            </span>
                                        </div>
                                    }
                                }) }
                                <button onclick={on_save_categories} class="w-full bg-slate-800 text-white py-2 rounded font-bold text-sm mt-2">
                                    {"Save Category Limits"}
                                </button>
                            </div>
                        }
                    }}
                    { if let Some(msg) = &*form_error {
                        html! { <p class="text-sm text-red-500 mt-3">{ msg.clone() }</p> }
                    } else { html!{} } }
                </div>
            </>
        },
    )
}

fn render_trend_chart(
    api: Api,
    seq: Rc<RefCell<u64>>,
    charts: Rc<RefCell<ChartRegistry>>,
    year: i32,
) {
    let cycle = bump(&seq);
    spawn_local(async move {
        match api.trends(year).await {
            Ok(raw) => {
                if !is_current(&seq, cycle) {
                    return;
                }
                let series = trend_for(&raw);
                let input = ChartInput {
                    labels: series.months.clone(),
                    series: vec![
                        Series {
                            name: "Monthly Expenses".to_string(),
                            values: series.expenses.clone(),
                        },
                        Series {
                            name: "Monthly Incomes".to_string(),
                            values: series.incomes.clone(),
                        },
                    ],
                    palette: &PALETTE,
                    format_value: format_usd,
                };
                charts
                    .borrow_mut()
                    .render(ChartKind::Line, "trend-chart", &input);
            }
            Err(ApiError::AuthRequired) => {}
            Err(err) => surface("Could not load the yearly trend", &err),
        }
    });
}

fn render_category_chart(
    api: Api,
    seq: Rc<RefCell<u64>>,
    charts: Rc<RefCell<ChartRegistry>>,
    year: i32,
    month: u32,
) {
    let cycle = bump(&seq);
    spawn_local(async move {
        match api.category_spending(year, month).await {
            Ok(totals) => {
                if !is_current(&seq, cycle) {
                    return;
                }
                // A month with rows but no spend would draw an invisible pie.
                let (labels, values) = if total_of(&totals) > 0.0 {
                    (
                        totals.keys().cloned().collect::<Vec<String>>(),
                        totals.values().copied().collect::<Vec<f64>>(),
                    )
                } else {
                    (Vec::new(), Vec::new())
                };
                charts.borrow_mut().render(
                    ChartKind::Pie,
                    "category-spending-chart",
                    &ChartInput::single("Spent", labels, values),
                );
            }
            Err(ApiError::AuthRequired) => {}
            Err(err) => surface("Could not load category spending", &err),
        }
    });
}

/// Income vs expense for the selected month, plus a trailing-six-month
/// expense comparison ending at that month.
fn render_income_expense_charts(
    api: Api,
    seq: Rc<RefCell<u64>>,
    charts: Rc<RefCell<ChartRegistry>>,
    year: i32,
    month: u32,
) {
    let cycle = bump(&seq);
    spawn_local(async move {
        let result = async {
            let pair = api.income_vs_expense(year, month).await?;
            let window = trailing_months(year, month, 6);
            let mut expenses = Vec::with_capacity(window.len());
            for m in &window {
                expenses.push(api.income_vs_expense(m.year, m.month).await?.expense);
            }
            Ok::<_, ApiError>((pair, window, expenses))
        }
        .await;

        if !is_current(&seq, cycle) {
            return;
        }
        match result {
            Ok((pair, window, expenses)) => {
                charts.borrow_mut().render(
                    ChartKind::Bar,
                    "income-expense-chart",
                    &ChartInput::single(
                        "Amount",
                        vec!["Income".to_string(), "Expenses".to_string()],
                        vec![pair.income, pair.expense],
                    ),
                );
                let labels: Vec<String> = window.iter().map(|m| m.label.clone()).collect();
                charts.borrow_mut().render(
                    ChartKind::Bar,
                    "trailing-chart",
                    &ChartInput::single("Expenses", labels, expenses),
                );
            }
            Err(ApiError::AuthRequired) => {}
            Err(err) => surface("Could not load income vs expense", &err),
        }
    });
}

fn year_select(value: &str, onchange: Callback<Event>) -> Html {
    let this_year = current_year();
    let years: Vec<String> = (this_year - 3..=this_year).map(|y| y.to_string()).collect();
    html! {
        <select onchange={onchange} class="p-2 border rounded text-sm">
            { for years.iter().map(|year| html! {
                <option value={year.clone()} selected={*year == value}>{ year.clone() }</option>
            }) }
        </select>
    }
}

fn month_select(value: &str, onchange: Callback<Event>) -> Html {
    html! {
        <select onchange={onchange} class="p-2 border rounded text-sm">
            { for MONTH_LABELS.iter().enumerate().map(|(i, label)| {
                let number = (i + 1).to_string();
                html! {
                    <option value={number.clone()} selected={number == value}>{ *label }</option>
                }
            }) }
        </select>
    }
}

#[function_component(ReportsPage)]
fn reports_page() -> Html {
    let api = use_context::<Api>().unwrap_or_default();
    let charts = use_mut_ref(ChartRegistry::default);
    let trend_seq = use_mut_ref(|| 0u64);
    let category_seq = use_mut_ref(|| 0u64);
    let income_seq = use_mut_ref(|| 0u64);

    let trend_year = use_state(|| current_year().to_string());
    let category_year = use_state(|| current_year().to_string());
    let category_month = use_state(|| current_month().to_string());
    let income_year = use_state(|| current_year().to_string());
    let income_month = use_state(|| current_month().to_string());

    {
        let api = api.clone();
        let seq = trend_seq.clone();
        let charts = charts.clone();
        use_effect_with_deps(
            move |year: &String| {
                let year = year.parse::<i32>().unwrap_or_else(|_| current_year());
                render_trend_chart(api, seq, charts, year);
                || ()
            },
            (*trend_year).clone(),
        );
    }

    {
        let api = api.clone();
        let seq = category_seq.clone();
        let charts = charts.clone();
        use_effect_with_deps(
            move |(year, month): &(String, String)| {
                let year = year.parse::<i32>().unwrap_or_else(|_| current_year());
                let month = month.parse::<u32>().unwrap_or_else(|_| current_month());
                render_category_chart(api, seq, charts, year, month);
                || ()
            },
            ((*category_year).clone(), (*category_month).clone()),
        );
    }

    {
        let api = api.clone();
        let seq = income_seq.clone();
        let charts = charts.clone();
        use_effect_with_deps(
            move |(year, month): &(String, String)| {
                let year = year.parse::<i32>().unwrap_or_else(|_| current_year());
                let month = month.parse::<u32>().unwrap_or_else(|_| current_month());
                render_income_expense_charts(api, seq, charts, year, month);
                || ()
            },
            ((*income_year).clone(), (*income_month).clone()),
        );
    }

    let select_state = |handle: UseStateHandle<String>| {
        Callback::from(move |e: Event| {
            let input: web_sys::HtmlSelectElement = e.target_unchecked_into();
            handle.set(input.value());
        })
    };

    page_shell(
        "Reports",
        html! {
            <>
                <div class="bg-white rounded-xl p-6 border border-slate-200">
                    <div class="flex items-center justify-between mb-4">
                        <h3 class="font-bold text-slate-800 text-lg">{"Monthly Trend"}</h3>
                        { year_select(&trend_year, select_state(trend_year.clone())) }
                    </div>
                    <div class="h-72">
                        <canvas id="trend-chart"></canvas>
                    </div>
                </div>

                <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <div class="flex items-center justify-between mb-4 gap-2">
                            <h3 class="font-bold text-slate-800 text-lg">{"Category Spending"}</h3>
                            <div class="flex gap-2">
                                { year_select(&category_year, select_state(category_year.clone())) }
                                { month_select(&category_month, select_state(category_month.clone())) }
                            </div>
                        </div>
                        <div class="h-64">
                            <canvas id="category-spending-chart"></canvas>
                        </div>
                    </div>

                    <div class="bg-white rounded-xl p-6 border border-slate-200">
                        <div class="flex items-center justify-between mb-4 gap-2">
                            <h3 class="font-bold text-slate-800 text-lg">{"Income vs Expense"}</h3>
                            <div class="flex gap-2">
                                { year_select(&income_year, select_state(income_year.clone())) }
                                { month_select(&income_month, select_state(income_month.clone())) }
                            </div>
                        </div>
                        <div class="h-64">
                            <canvas id="income-expense-chart"></canvas>
                        </div>
                    </div>
                </div>

                <div class="bg-white rounded-xl p-6 border border-slate-200">
                    <h3 class="font-bold text-slate-800 text-lg mb-4">{"Last 6 Months"}</h3>
                    <div class="h-64">
                        <canvas id="trailing-chart"></canvas>
                    </div>
                </div>
            </>
        },
    )
}

#[derive(Properties, PartialEq)]
struct LoginProps {
    on_authenticated: Callback<()>,
}

#[function_component(LoginScreen)]
fn login_screen(props: &LoginProps) -> Html {
    let api = Api::default();
    let username = use_state(String::new);
    let password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);

    let on_submit = {
        let api = api.clone();
        let username = username.clone();
        let password = password.clone();
        let error = error.clone();
        let loading = loading.clone();
        let on_authenticated = props.on_authenticated.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let username_val = username.trim().to_string();
            let password_val = (*password).clone();

            if username_val.is_empty() || password_val.is_empty() {
                error.set(Some("Username and password are required".to_string()));
                return;
            }

            loading.set(true);
            error.set(None);

            let api = api.clone();
            let error = error.clone();
            let loading = loading.clone();
            let on_authenticated = on_authenticated.clone();
            spawn_local(async move {
                match api.login(&username_val, &password_val).await {
                    Ok(()) => on_authenticated.emit(()),
                    Err(err) => error.set(Some(err.to_string())),
                }
                loading.set(false);
            });
        })
    };

    html! {
        <div class="min-h-screen flex items-center justify-center bg-slate-100">
            <div class="w-full max-w-md bg-white border border-slate-200 rounded-2xl shadow-lg p-8">
                <div class="text-center mb-6">
                    <h1 class="text-2xl font-bold text-slate-800">{"Welcome back"}</h1>
                    <p class="text-sm text-slate-500 mt-2">{"Sign in to track your spending."}</p>
                </div>

                <form class="space-y-4" onsubmit={on_submit}>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-slate-700">{"Username"}</label>
                        <input
                            type="text"
                            class="w-full px-4 py-2 border border-slate-300 rounded-lg"
                            value={(*username).clone()}
                            oninput={{
                                let username = username.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    username.set(input.value());
                                })
                            }}
                        />
                    </div>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-slate-700">{"Password"}</label>
                        <input
                            type="password"
                            class="w-full px-4 py-2 border border-slate-300 rounded-lg"
                            value={(*password).clone()}
                            oninput={{
                                let password = password.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    password.set(input.value());
                                })
                            }}
                        />
                    </div>

                    if let Some(msg) = &*error {
                        <div class="text-sm text-red-500">{ msg.clone() }</div>
                    }

                    <button
                        type="submit"
                        class="w-full bg-slate-800 text-white py-2 rounded-lg font-semibold"
                        disabled={*loading}
                    >
                        { if *loading { "Please wait..." } else { "Login" } }
                    </button>
                </form>
            </div>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let active_page = use_state(|| Page::Dashboard);
    let authenticated = use_state(|| Api::default().session.has_token());
    let on_select = {
        let active_page = active_page.clone();
        Callback::from(move |page: Page| active_page.set(page))
    };

    if !*authenticated {
        let on_authenticated = {
            let authenticated = authenticated.clone();
            Callback::from(move |_| authenticated.set(true))
        };
        return html! { <LoginScreen on_authenticated={on_authenticated} /> };
    }

    let content = match *active_page {
        Page::Dashboard => html! { <DashboardPage /> },
        Page::Income => html! { <IncomePage /> },
        Page::Budgets => html! { <BudgetsPage /> },
        Page::Reports => html! { <ReportsPage /> },
    };

    html! {
        <ContextProvider<Api> context={Api::default()}>
            <Layout active_page={*active_page} on_select={on_select}>
                { content }
            </Layout>
        </ContextProvider<Api>>
    }
}

fn icon_base(path: &'static str) -> Html {
    html! {
        <svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">
            <path d={path}></path>
        </svg>
    }
}

fn icon_layout_grid() -> Html {
    icon_base("M3 3h8v8H3zM13 3h8v8h-8zM3 13h8v8H3zM13 13h8v8h-8z")
}
fn icon_wallet() -> Html {
    icon_base("M3 7h18v10H3zM16 7V5H5v2")
}
fn icon_trending_up() -> Html {
    icon_base("M3 17l6-6 4 4 7-7")
}
fn icon_bar_chart() -> Html {
    icon_base("M4 20V10M10 20V4M16 20v-6M22 20H2")
}
fn icon_log_out() -> Html {
    icon_base("M9 21H5a2 2 0 01-2-2V5a2 2 0 012-2h4M16 17l5-5-5-5M21 12H9")
}

fn main() {
    yew::Renderer::<App>::new().render();
}
