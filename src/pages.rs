//! Server-rendered pages. Plain HTML strings, no templating engine; the
//! surface is a handful of small forms and one table.

use crate::model::attendance::AttendanceRecord;

pub const SUBJECTS: [&str; 9] = [
    "ML",
    "DBMS",
    "DLCO",
    "P and S",
    "MEFA",
    "ML LAB",
    "DBMS LAB",
    "FULL STACK LAB",
    "DT and I LAB",
];

pub const BRANCHES: [&str; 11] = [
    "CAI", "CSM", "CSD", "CSE-A", "CSE-B", "CSE-C", "CSE-D", "MECH", "EEE", "ECE", "CIVIL",
];

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

fn options(values: &[&str], selected: Option<&str>) -> String {
    let mut out = String::from("<option value=\"\">All</option>");
    for v in values {
        let sel = if selected == Some(*v) { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(v),
            sel
        ));
    }
    out
}

pub fn login_page(error: bool) -> String {
    let notice = if error {
        "<p>Invalid credentials</p>"
    } else {
        ""
    };
    layout(
        "Admin Login",
        &format!(
            "<h2>Admin Login</h2>{notice}\
             <form method=\"post\" action=\"/\">\
             <input name=\"username\" placeholder=\"Username\" required>\
             <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\
             <button type=\"submit\">Login</button></form>"
        ),
    )
}

/// Result of the most recent /generate call, shown on the dashboard.
pub struct QrPanel {
    pub expiry: String,
    pub subject: Option<String>,
    pub branch: Option<String>,
    pub error: Option<String>,
}

pub fn admin_page(added: Option<&str>, qr: Option<&QrPanel>) -> String {
    let flash = match added {
        Some("1") => "<p>Record added.</p>",
        Some("exists") => "<p>Attendance already marked for that student.</p>",
        Some("error") => "<p>Roll and name are required.</p>",
        _ => "",
    };

    let qr_block = match qr {
        Some(panel) => match &panel.error {
            Some(err) => format!("<p>QR generation failed: {}</p>", escape(err)),
            None => format!(
                "<p>Scan before <b>{}</b>{}{}</p>\
                 <img src=\"/static/qr.png\" alt=\"Attendance QR\" width=\"240\" height=\"240\">",
                escape(&panel.expiry),
                panel
                    .subject
                    .as_deref()
                    .map(|s| format!(", subject {}", escape(s)))
                    .unwrap_or_default(),
                panel
                    .branch
                    .as_deref()
                    .map(|b| format!(", branch {}", escape(b)))
                    .unwrap_or_default(),
            ),
        },
        None => String::new(),
    };

    layout(
        "Admin Dashboard",
        &format!(
            "<h2>Admin Dashboard</h2>{flash}\
             <p><a href=\"/view\">View records</a> | <a href=\"/logout\">Logout</a></p>\
             <h3>Generate QR</h3>\
             <form method=\"get\" action=\"/generate\">\
             <select name=\"sub\">{subjects}</select>\
             <select name=\"branch\">{branches}</select>\
             <button type=\"submit\">Generate</button></form>\
             {qr_block}\
             <h3>Manual Add</h3>\
             <form method=\"post\" action=\"/manual_add\">\
             <input name=\"roll\" placeholder=\"Roll\">\
             <input name=\"name\" placeholder=\"Name\">\
             <select name=\"subject\">{subjects}</select>\
             <select name=\"branch\">{branches}</select>\
             <input name=\"date\" placeholder=\"YYYY-MM-DD\">\
             <input name=\"time\" placeholder=\"HH:MM:SS\">\
             <button type=\"submit\">Add</button></form>",
            subjects = options(&SUBJECTS, None),
            branches = options(&BRANCHES, None),
        ),
    )
}

/// The roll/name form a student sees after scanning. `action_query` is the
/// token's own query string so the POST carries the same expiry and
/// subject/branch the QR encoded.
pub fn scan_page(action_query: &str) -> String {
    layout(
        "Mark Attendance",
        &format!(
            "<h2>Mark Attendance</h2>\
             <form method=\"post\" action=\"/scan?{}\">\
             <input name=\"roll\" placeholder=\"Roll Number\" required>\
             <input name=\"name\" placeholder=\"Full Name\" required>\
             <button type=\"submit\">Submit</button></form>",
            escape(action_query)
        ),
    )
}

pub fn success_page() -> String {
    layout(
        "Attendance Marked",
        "<h2>Attendance Marked ✅</h2><p>You may close this page.</p>",
    )
}

pub fn view_page(
    rows: &[AttendanceRecord],
    selected_subject: Option<&str>,
    selected_branch: Option<&str>,
    cleared: Option<&str>,
    backup: Option<&str>,
    added: Option<&str>,
) -> String {
    let mut flash = String::new();
    match cleared {
        Some("1") => {
            flash.push_str("<p>Records cleared.");
            if let Some(backup) = backup {
                flash.push_str(&format!(
                    " Backup: <a href=\"/static/backups/{0}\">{0}</a>",
                    escape(backup)
                ));
            }
            flash.push_str("</p>");
        }
        Some("2") => flash.push_str("<p>No matching records to clear.</p>"),
        _ => {}
    }
    if added == Some("1") {
        flash.push_str("<p>Record added.</p>");
    }

    let mut table = String::from(
        "<table border=\"1\"><tr><th>Roll</th><th>Name</th><th>Date</th><th>Time</th>\
         <th>Subject</th><th>Branch</th><th></th></tr>",
    );
    for r in rows {
        let subject = r.subject.as_deref().unwrap_or("");
        let delete = format!(
            "/delete?roll={}&date={}&time={}&subject={}",
            urlencoding::encode(&r.roll),
            urlencoding::encode(&r.date),
            urlencoding::encode(&r.time),
            urlencoding::encode(subject),
        );
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><a href=\"{}\">delete</a></td></tr>",
            escape(&r.roll),
            escape(&r.name),
            escape(&r.date),
            escape(&r.time),
            escape(subject),
            escape(r.branch.as_deref().unwrap_or("")),
            escape(&delete),
        ));
    }
    table.push_str("</table>");

    let export_link = {
        let mut qs = Vec::new();
        if let Some(s) = selected_subject {
            qs.push(format!("sub={}", urlencoding::encode(s)));
        }
        if let Some(b) = selected_branch {
            qs.push(format!("branch={}", urlencoding::encode(b)));
        }
        if qs.is_empty() {
            "/export".to_string()
        } else {
            format!("/export?{}", qs.join("&"))
        }
    };

    layout(
        "Attendance Records",
        &format!(
            "<h2>Attendance Records</h2>{flash}\
             <p><a href=\"/admin\">Dashboard</a> | <a href=\"{export}\">Export CSV</a></p>\
             <form method=\"get\" action=\"/view\">\
             <select name=\"sub\">{subjects}</select>\
             <select name=\"branch\">{branches}</select>\
             <button type=\"submit\">Filter</button></form>\
             {table}\
             <form method=\"post\" action=\"/clear_all\" \
             onsubmit=\"return confirm('Back up and delete these records?')\">\
             <input type=\"hidden\" name=\"subject\" value=\"{sub_val}\">\
             <input type=\"hidden\" name=\"branch\" value=\"{branch_val}\">\
             <button type=\"submit\">Clear (with backup)</button></form>",
            export = escape(&export_link),
            subjects = options(&SUBJECTS, selected_subject),
            branches = options(&BRANCHES, selected_branch),
            sub_val = escape(selected_subject.unwrap_or("")),
            branch_val = escape(selected_branch.unwrap_or("")),
        ),
    )
}
