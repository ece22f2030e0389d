use inferload::error::AppResult;

fn main() -> AppResult<()> {
    inferload::run()
}
