use crate::calendar::first_of_month;
use crate::engine::{Outcome, SimulationResult};
use crate::plan::SimulationInput;
use chrono::NaiveDate;
use std::path::Path;

// ═══════════════════════════════════════════════════════════════════════
// Outcome text
// ═══════════════════════════════════════════════════════════════════════

/// Plain-text verdict, one line per fact.
pub fn outcome_message(result: &SimulationResult) -> Vec<String> {
    let payment = format!("Monthly Loan Payment: ${:.2}", result.monthly_payment);
    match result.outcome {
        Outcome::Shortfall { date, cause } => vec![
            format!(
                "Insufficient Bitcoin to cover the {}. Shortfall detected on {}.",
                cause.label(),
                date_label(date)
            ),
            payment,
        ],
        _ => {
            let (btc, usd) = result
                .final_point()
                .map(|p| (p.asset_holdings, p.fiat_value))
                .unwrap_or((0.0, 0.0));
            vec![
                "Savings successfully covered down payment and all loan payments.".to_string(),
                payment,
                format!(
                    "Final Bitcoin holdings: {:.6} BTC, worth ${:.2} USD",
                    btc, usd
                ),
            ]
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Chart markers
// ═══════════════════════════════════════════════════════════════════════

/// A vertical annotation on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMarker {
    pub date: NaiveDate,
    pub color: &'static str,
    pub label: String,
}

/// Start-of-saving, purchase, and either shortfall or loan-payoff
/// markers. Dates snap to the month label they fall in.
pub fn chart_markers(result: &SimulationResult, input: &SimulationInput) -> [ChartMarker; 3] {
    let end = match result.outcome {
        Outcome::Shortfall { date, .. } => ChartMarker {
            date,
            color: "red",
            label: format!("Shortfall: {:.6} BTC", 0.0),
        },
        _ => ChartMarker {
            date: result.horizon,
            color: "black",
            label: format!("Loan Paid Off: {:.6} BTC", result.markers.at_end),
        },
    };

    [
        ChartMarker {
            date: first_of_month(input.start_date),
            color: "green",
            label: format!("Start Saving: {:.6} BTC", result.markers.at_start),
        },
        ChartMarker {
            date: first_of_month(input.purchase_date),
            color: "purple",
            label: format!("Purchase: {:.6} BTC", result.markers.at_purchase),
        },
        end,
    ]
}

// ═══════════════════════════════════════════════════════════════════════
// HTML helpers
// ═══════════════════════════════════════════════════════════════════════

fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn js_array_f64(data: &[f64], decimals: usize) -> String {
    let items: Vec<String> = data
        .iter()
        .map(|v| format!("{:.*}", decimals, v))
        .collect();
    format!("[{}]", items.join(","))
}

fn js_array_dates(data: &[NaiveDate]) -> String {
    let items: Vec<String> = data.iter().map(|d| format!("\"{}\"", date_label(*d))).collect();
    format!("[{}]", items.join(","))
}

fn js_annotations(markers: &[ChartMarker]) -> String {
    let items: Vec<String> = markers
        .iter()
        .map(|m| {
            format!(
                r#"{{type:'line',xMin:"{d}",xMax:"{d}",borderColor:'{c}',borderWidth:2,label:{{content:"{l}",display:true,position:'start'}}}}"#,
                d = date_label(m.date),
                c = m.color,
                l = m.label,
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

// ═══════════════════════════════════════════════════════════════════════
// Main report generation
// ═══════════════════════════════════════════════════════════════════════

pub fn generate_report(result: &SimulationResult, input: &SimulationInput, title: &str) -> String {
    let dates: Vec<NaiveDate> = result.series.iter().map(|p| p.date).collect();
    let btc: Vec<f64> = result.series.iter().map(|p| p.asset_holdings).collect();
    let usd: Vec<f64> = result.series.iter().map(|p| p.fiat_value).collect();
    let markers = chart_markers(result, input);

    let badge_class = if result.outcome.is_shortfall() {
        "shortfall"
    } else {
        "completed"
    };
    let message = outcome_message(result).join("<br>\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
<script src="https://cdn.jsdelivr.net/npm/chartjs-plugin-annotation@3"></script>
<style>
*{{margin:0;padding:0;box-sizing:border-box}}
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f5f5f5;color:#333}}
header{{background:#1a1a2e;color:#fff;padding:24px 32px;display:flex;align-items:center;gap:20px}}
header h1{{font-size:1.4em;font-weight:500}}
.badge{{padding:6px 16px;border-radius:4px;font-weight:700;font-size:0.9em;letter-spacing:0.5px}}
.badge.completed{{background:#34a853;color:#fff}}
.badge.shortfall{{background:#ea4335;color:#fff}}
main{{max-width:1200px;margin:0 auto;padding:24px}}
section{{background:#fff;border-radius:8px;box-shadow:0 1px 3px rgba(0,0,0,0.1);padding:24px;margin-bottom:20px}}
section h3{{font-size:1.1em;margin-bottom:16px;color:#1a1a2e;border-bottom:2px solid #e0e0e0;padding-bottom:8px}}
table{{width:100%;border-collapse:collapse;font-size:0.9em}}
th,td{{padding:8px 12px;text-align:left;border-bottom:1px solid #e0e0e0}}
th{{background:#f8f9fa;font-weight:600}}
canvas{{width:100%!important;height:420px!important}}
footer{{text-align:center;padding:16px;color:#999;font-size:0.8em}}
</style>
</head>
<body>
<header>
 <h1>{title}</h1>
 <span class="badge {badge_class}">{outcome_label}</span>
</header>
<main>

<section>
<h3>Result</h3>
<p id="result">{message}</p>
</section>

<section>
<h3>Plan</h3>
<table>
<tr><th>Parameter</th><th>Value</th></tr>
<tr><td>Initial Price</td><td>{initial_price:.2}</td></tr>
<tr><td>Contribution</td><td>{contribution:.2} ({frequency})</td></tr>
<tr><td>Annual Growth</td><td>{growth:.2}%</td></tr>
<tr><td>Savings Window</td><td>{start} to {end}</td></tr>
<tr><td>Purchase Date</td><td>{purchase}</td></tr>
<tr><td>Total Cost</td><td>{total_cost:.2}</td></tr>
<tr><td>Down Payment</td><td>{down_payment:.2}</td></tr>
<tr><td>Interest Rate</td><td>{interest:.2}%</td></tr>
<tr><td>Loan Term</td><td>{term} months</td></tr>
</table>
</section>

<section>
<h3>Holdings Over Time</h3>
<canvas id="savingsChart"></canvas>
</section>

<section>
<h3>Data Export</h3>
<button onclick="downloadCSV()" style="padding:8px 20px;background:#4285f4;color:#fff;border:none;border-radius:4px;cursor:pointer;font-size:0.9em">Download CSV</button>
</section>

</main>
<footer>Generated by btc-loan-sim</footer>

<script>
const L={js_dates};
const BTC={js_btc};
const USD={js_usd};
new Chart(document.getElementById('savingsChart'),{{type:'line',data:{{labels:L,datasets:[
 {{label:'USD Value',data:USD,borderColor:'blue',yAxisID:'y-usd',fill:false,pointRadius:0}},
 {{label:'BTC Value',data:BTC,borderColor:'orange',yAxisID:'y-btc',fill:false,pointRadius:0}}
]}},options:{{responsive:true,maintainAspectRatio:false,scales:{{
 x:{{title:{{display:true,text:'Date'}},ticks:{{maxTicksLimit:12}}}},
 'y-usd':{{type:'linear',position:'left',title:{{display:true,text:'USD Value'}},beginAtZero:true}},
 'y-btc':{{type:'linear',position:'right',title:{{display:true,text:'BTC Value'}},beginAtZero:true,grid:{{drawOnChartArea:false}}}}
}},plugins:{{annotation:{{annotations:{js_annotations}}}}}}}}});

function downloadCSV(){{
 let csv='Date,Asset Value,Fiat Value\n';
 for(let i=0;i<L.length;i++){{
  csv+=L[i]+','+BTC[i].toFixed(6)+','+USD[i].toFixed(2)+'\n';
 }}
 const blob=new Blob([csv],{{type:'text/csv;charset=utf-8;'}});
 const url=URL.createObjectURL(blob);
 const a=document.createElement('a');
 a.href=url;a.download='bitcoin_savings.csv';a.click();
 URL.revokeObjectURL(url);
}}
</script>
</body>
</html>"#,
        title = title,
        badge_class = badge_class,
        outcome_label = result.outcome.label(),
        message = message,
        initial_price = input.initial_price,
        contribution = input.contribution_amount,
        frequency = input.contribution_frequency,
        growth = input.annual_growth_rate * 100.0,
        start = date_label(input.start_date),
        end = date_label(input.end_date),
        purchase = date_label(input.purchase_date),
        total_cost = input.total_cost,
        down_payment = input.down_payment,
        interest = input.annual_interest_rate * 100.0,
        term = input.loan_term_months,
        js_dates = js_array_dates(&dates),
        js_btc = js_array_f64(&btc, 8),
        js_usd = js_array_f64(&usd, 2),
        js_annotations = js_annotations(&markers),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// File I/O
// ═══════════════════════════════════════════════════════════════════════

pub fn save_report(html: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}
