use std::process::Command;

const FALLBACK_CSS: &str = r#"*, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: "Tajawal", system-ui, sans-serif; line-height: 1.7; color: #1c1917; background: #fafaf9; direction: rtl; }
a { color: inherit; text-decoration: none; }
img { max-width: 100%; }
.min-h-screen { min-height: 100vh; }
.mx-auto { margin-left: auto; margin-right: auto; }
.max-w-6xl { max-width: 72rem; }
.max-w-xl { max-width: 36rem; }
.max-w-md { max-width: 28rem; }
.px-4 { padding-left: 1rem; padding-right: 1rem; }
.py-3 { padding-top: 0.75rem; padding-bottom: 0.75rem; }
.py-6 { padding-top: 1.5rem; padding-bottom: 1.5rem; }
.py-8 { padding-top: 2rem; padding-bottom: 2rem; }
.py-16 { padding-top: 4rem; padding-bottom: 4rem; }
.mb-2 { margin-bottom: 0.5rem; }
.mb-4 { margin-bottom: 1rem; }
.mt-1 { margin-top: 0.25rem; }
.mt-2 { margin-top: 0.5rem; }
.mt-4 { margin-top: 1rem; }
.ml-auto { margin-left: auto; }
.block { display: block; }
.flex { display: flex; }
.items-center { align-items: center; }
.justify-center { justify-content: center; }
.justify-between { justify-content: space-between; }
.gap-2 { gap: 0.5rem; }
.gap-3 { gap: 0.75rem; }
.gap-4 { gap: 1rem; }
.w-full { width: 100%; }
.text-center { text-align: center; }
.text-xs { font-size: 0.75rem; }
.text-sm { font-size: 0.875rem; }
.text-lg { font-size: 1.125rem; }
.text-xl { font-size: 1.25rem; }
.text-4xl { font-size: 2.25rem; }
.font-medium { font-weight: 500; }
.font-semibold { font-weight: 600; }
.font-bold { font-weight: 700; }
.text-stone-400 { color: #a8a29e; }
.text-stone-500 { color: #78716c; }
.text-stone-600 { color: #57534e; }
.bg-white { background-color: #fff; }
.bg-stone-50 { background-color: #fafaf9; }
.border-b { border-bottom: 1px solid #e7e5e4; }
.border-t { border-top: 1px solid #e7e5e4; }
.whitespace-pre-wrap { white-space: pre-wrap; }
.btn { display: inline-flex; align-items: center; justify-content: center; padding: 0.5rem 1rem; border-radius: 0.5rem; font-size: 0.875rem; font-weight: 500; cursor: pointer; border: none; }
.btn-primary { background: #1c1917; color: #fff; }
.btn-primary:hover { background: #44403c; }
.btn-secondary { background: #fff; color: #1c1917; border: 1px solid #d6d3d1; }
.btn-secondary:hover { background: #f5f5f4; }
.card { background: #fff; border-radius: 0.75rem; border: 1px solid #e7e5e4; padding: 1.5rem; box-shadow: 0 1px 2px 0 rgb(0 0 0 / 0.05); }
.input { width: 100%; border: 1px solid #d6d3d1; border-radius: 0.5rem; padding: 0.5rem 0.75rem; font: inherit; }
.form { display: flex; flex-direction: column; gap: 0.75rem; }
.link { color: #b45309; text-decoration: underline; background: none; border: none; cursor: pointer; font: inherit; }
.alert-error { border-radius: 0.5rem; background: #fef2f2; color: #b91c1c; padding: 0.75rem 1rem; }
.field-error { font-size: 0.75rem; color: #dc2626; }
.feed-layout { display: grid; gap: 1.5rem; }
@media (min-width: 1024px) { .feed-layout { grid-template-columns: 16rem 1fr 16rem; } .feed { order: 2; } }
.post-card { margin-bottom: 1rem; }
.post-image { margin-top: 0.75rem; border-radius: 0.5rem; max-height: 24rem; width: 100%; object-fit: cover; }
.action { font-size: 0.875rem; color: #57534e; background: none; border: none; cursor: pointer; }
.action-active { color: #e11d48; font-weight: 600; }
.action-danger { color: #dc2626; }
.avatar { width: 2.5rem; height: 2.5rem; border-radius: 9999px; object-fit: cover; }
.avatar-sm { width: 2rem; height: 2rem; }
.avatar-lg { width: 6rem; height: 6rem; margin: 0 auto; }
.avatar-initial { display: inline-flex; align-items: center; justify-content: center; background: #e7e5e4; font-weight: 700; }
.badge { display: inline-block; border-radius: 9999px; padding: 0.125rem 0.5rem; font-size: 0.75rem; }
.badge-owner { background: #fef3c7; color: #92400e; }
.toast { position: fixed; top: 1rem; left: 50%; transform: translateX(-50%); border-radius: 0.5rem; padding: 0.75rem 1rem; z-index: 50; box-shadow: 0 4px 6px rgb(0 0 0 / 0.1); }
.toast-success { background: #059669; color: #fff; }
.toast-error { background: #dc2626; color: #fff; }
.category-link { display: flex; justify-content: space-between; border-radius: 0.5rem; padding: 0.5rem 0.75rem; }
.category-link:hover { background: #f5f5f4; }
.category-active { background: #1c1917; color: #fff; }
.share { position: relative; }
.share-menu { position: absolute; background: #fff; border: 1px solid #e7e5e4; border-radius: 0.5rem; padding: 0.5rem; display: flex; flex-direction: column; gap: 0.25rem; z-index: 10; }
.cat-romantic { background: #fce7f3; color: #9d174d; }
.cat-philosophical { background: #e0e7ff; color: #3730a3; }
.cat-religious { background: #d1fae5; color: #065f46; }
.cat-sad { background: #e2e8f0; color: #1e293b; }
.cat-sarcastic { background: #ffedd5; color: #9a3412; }
.cat-inspiring { background: #fef9c3; color: #854d0e; }
.cat-patriotic { background: #dcfce7; color: #166534; }
.cat-none { background: #f5f5f4; color: #44403c; }
"#;

fn main() {
    // Only rebuild CSS when template or CSS files change
    println!("cargo:rerun-if-changed=assets/css/input.css");
    println!("cargo:rerun-if-changed=templates/");

    let status = Command::new("tailwindcss")
        .args([
            "-i",
            "assets/css/input.css",
            "-o",
            "assets/css/output.css",
            "--minify",
        ])
        .status();

    match status {
        Ok(s) if s.success() => {
            println!("cargo:warning=Tailwind CSS compiled successfully");
        }
        _ => {
            println!("cargo:warning=Tailwind CLI not found, using fallback CSS");
            std::fs::create_dir_all("assets/css").ok();
            std::fs::write("assets/css/output.css", FALLBACK_CSS).ok();
        }
    }
}
